use std::sync::Arc;

use anyhow::Result;

use taglog_db::{Database, StoreError};
use taglog_service::{DumpRequest, TagService};
use taglog_types::Style;

fn service() -> TagService {
    TagService::new(Arc::new(Database::open_in_memory().unwrap()))
}

fn classic_dump(guild_id: i64, start: i64, end: i64) -> DumpRequest {
    DumpRequest {
        guild_id,
        start,
        end,
        author_id: None,
        style: Style::Classic {
            url: None,
            url_is_permanent: false,
        },
        limit: 10,
        min_stars: 0,
        offset: 0,
    }
}

#[test]
fn end_to_end_classic_dump() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "x", 7, false, 0)?;
    svc.create_tag(2, 1, 200, "y", 7, false, 0)?;
    for _ in 0..5 {
        svc.vote(2, 1)?;
    }

    let text = svc.dump(&classic_dump(1, 0, 300))?.expect("two tags in window");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], " <t:0:f> 2 tags (0.4/min)");
    assert_eq!(lines[1], "x 1m40s");
    assert_eq!(lines[2], "y (5) 3m20s");
    Ok(())
}

#[test]
fn contains_reflects_net_effect_of_mutations() -> Result<()> {
    let svc = service();
    assert!(!svc.store().contains(1)?);

    svc.create_tag(1, 1, 100, "x", 7, false, 0)?;
    svc.edit_tag(1, "x2", 1)?;
    svc.vote(1, 1)?;
    svc.vote(1, -1)?;
    assert!(svc.store().contains(1)?);

    svc.delete_tag(1)?;
    assert!(!svc.store().contains(1)?);
    Ok(())
}

#[test]
fn deleting_missing_tag_is_not_found_and_changes_nothing() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "keep", 7, false, 0)?;

    assert!(matches!(svc.delete_tag(99), Err(StoreError::NotFound)));
    assert!(svc.store().contains(1)?);
    Ok(())
}

#[test]
fn vote_rejects_other_deltas() {
    let svc = service();
    assert!(matches!(
        svc.vote(1, 2),
        Err(StoreError::InvalidArgument(_))
    ));
    assert!(matches!(svc.vote(1, 0), Err(StoreError::InvalidArgument(_))));
}

#[test]
fn adjust_latest_shifts_most_recent_tag_cumulatively() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "old", 7, false, 0)?;
    svc.create_tag(2, 1, 500, "new", 7, false, 0)?;

    svc.adjust_latest(1, 7, -30, 1_000)?;
    svc.adjust_latest(1, 7, -30, 1_000)?;

    let text = svc.dump(&classic_dump(1, 0, 1_000))?.expect("tags present");
    assert!(text.contains("new 7m20s"), "got {text:?}"); // 500 - 60 = 440
    assert!(text.contains("old 1m40s"));

    // too large an offset is rejected before any I/O
    assert!(matches!(
        svc.adjust_latest(1, 7, 7201, 1_000),
        Err(StoreError::InvalidArgument(_))
    ));
    // an author with no tags has nothing to adjust
    assert!(matches!(
        svc.adjust_latest(1, 8, 10, 1_000),
        Err(StoreError::NotFound)
    ));
    Ok(())
}

#[test]
fn dump_thresholds_by_votes_and_reports_empty_as_none() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "quiet", 7, false, 0)?;
    svc.create_tag(2, 1, 200, "popular", 7, false, 0)?;
    for _ in 0..3 {
        svc.vote(2, 1)?;
    }

    let mut req = classic_dump(1, 0, 300);
    req.min_stars = 2;
    let text = svc.dump(&req)?.expect("one tag over threshold");
    assert!(text.contains("popular"));
    assert!(!text.contains("quiet"));

    req.min_stars = 10;
    assert_eq!(svc.dump(&req)?, None);

    // empty window is also None, not an empty transcript
    assert_eq!(svc.dump(&classic_dump(2, 0, 300))?, None);
    Ok(())
}

#[test]
fn dump_excludes_hidden_tags() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "public", 7, false, 0)?;
    svc.create_tag(2, 1, 150, "private", 7, true, 0)?;

    let text = svc.dump(&classic_dump(1, 0, 300))?.expect("public tag");
    assert!(text.contains("public"));
    assert!(!text.contains("private"));
    Ok(())
}

#[test]
fn dump_scoped_to_one_author() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "mine", 7, false, 0)?;
    svc.create_tag(2, 1, 150, "theirs", 8, false, 0)?;

    let mut req = classic_dump(1, 0, 300);
    req.author_id = Some(7);
    let text = svc.dump(&req)?.expect("own tag");
    assert!(text.contains("mine"));
    assert!(!text.contains("theirs"));
    Ok(())
}

#[test]
fn duplicate_create_propagates() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "x", 7, false, 0)?;
    assert!(matches!(
        svc.create_tag(1, 1, 200, "y", 7, false, 0),
        Err(StoreError::DuplicateKey(1))
    ));
    Ok(())
}

#[test]
fn dump_renders_the_tree_style() -> Result<()> {
    let svc = service();
    svc.create_tag(1, 1, 100, "a", 7, false, 0)?;
    svc.create_tag(2, 1, 110, "b", 7, false, 1)?;
    svc.create_tag(3, 1, 120, "c", 7, false, 1)?;
    svc.create_tag(4, 1, 130, "d", 7, false, 0)?;

    let mut req = classic_dump(1, 0, 300);
    req.style = Style::Alternative {
        url: None,
        url_is_permanent: false,
    };
    let text = svc.dump(&req)?.expect("four tags");
    let lines: Vec<&str> = text.lines().collect();
    assert!(lines[2].starts_with('├'));
    assert!(lines[3].starts_with('└'));
    Ok(())
}
