use framegen_core::SiteSettings;
use framegen_plan::{sample_plan, validate_plan, DesignSpace, GroupId, GroupMapping, SamplerConfig};
use proptest::prelude::*;

proptest! {
    #[test]
    fn bands_partition_every_story(story_count in 1u32..=60) {
        let mapping = GroupMapping::split(story_count);
        let mut covered = 0u32;
        for group in GroupId::ALL {
            let band = mapping.band(group);
            covered += band.count();
            for story in band.first..=band.last {
                prop_assert_eq!(mapping.group_of(story), Some(group));
            }
        }
        prop_assert_eq!(covered, story_count);
        prop_assert_eq!(mapping.band(GroupId::Bottom).count(), 1);
        // Middle never smaller than top.
        prop_assert!(mapping.band(GroupId::Middle).count() >= mapping.band(GroupId::Top).count());
    }

    #[test]
    fn any_seed_yields_a_valid_plan(seed in any::<u64>()) {
        let plan = sample_plan(
            &DesignSpace::default(),
            &SiteSettings::default(),
            &SamplerConfig::new(5, seed),
        ).expect("sample");
        prop_assert!(!plan.exhausted);
        validate_plan(&plan.cases).expect("valid plan");
        for case in &plan.cases {
            for group in &case.sizing {
                prop_assert!(group.beams.edge_width_mm <= group.beams.edge_depth_mm);
                prop_assert!(group.beams.interior_width_mm <= group.beams.interior_depth_mm);
            }
        }
    }
}
