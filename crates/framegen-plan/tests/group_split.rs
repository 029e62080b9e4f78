use framegen_plan::{GroupId, GroupMapping};

#[test]
fn ten_stories_split_one_five_four() {
    let mapping = GroupMapping::split(10);
    let bottom = mapping.band(GroupId::Bottom);
    let middle = mapping.band(GroupId::Middle);
    let top = mapping.band(GroupId::Top);

    assert_eq!((bottom.first, bottom.last), (1, 1));
    assert_eq!((middle.first, middle.last), (2, 6));
    assert_eq!((top.first, top.last), (7, 10));
}

#[test]
fn larger_remainder_goes_to_the_middle_band() {
    // 8 stories: bottom 1, remaining 7 -> middle 4, top 3.
    let mapping = GroupMapping::split(8);
    assert_eq!(mapping.band(GroupId::Middle).count(), 4);
    assert_eq!(mapping.band(GroupId::Top).count(), 3);
}

#[test]
fn every_story_maps_to_exactly_one_group() {
    for story_count in 4..=8 {
        let mapping = GroupMapping::split(story_count);
        for story in 1..=story_count {
            assert!(
                mapping.group_of(story).is_some(),
                "story {story} of {story_count} unmapped"
            );
        }
        assert_eq!(mapping.group_of(story_count + 1), None);
        let total: u32 = GroupId::ALL
            .into_iter()
            .map(|g| mapping.band(g).count())
            .sum();
        assert_eq!(total, story_count);
    }
}

#[test]
fn stories_carried_counts_from_band_bottom_to_roof() {
    let mapping = GroupMapping::split(10);
    assert_eq!(mapping.stories_carried(GroupId::Bottom, 10), 10);
    assert_eq!(mapping.stories_carried(GroupId::Middle, 10), 9);
    assert_eq!(mapping.stories_carried(GroupId::Top, 10), 4);
}
