use std::fs;
use std::path::Path;

use chrono::FixedOffset;
use tempfile::{tempdir, TempDir};

use blog_archive::{Archive, ArchiveConfig, ArchiveError, ErrorKind, IndexKind, IndexState, PersistentArchive, Post};

fn write_post(dir: &Path, file_name: &str, tags: &str, title: &str) {
    fs::write(dir.join(file_name), format!("{}\n\n# {}\n\nBody of {}.\n", tags, title, title)).unwrap();
}

fn published_dir() -> TempDir {
    let dir = tempdir().unwrap();
    write_post(dir.path(), "1514618960_a.md", "#post", "A");
    write_post(dir.path(), "1514618983_b.md", "#post", "B");
    write_post(dir.path(), "1523335881_c.md", "#smash #nintendo", "C");
    dir
}

fn titles(posts: &[&Post]) -> Vec<String> {
    posts.iter().map(|p| p.title().to_string()).collect()
}

#[test]
fn test_range_and_tag_queries() -> blog_archive::Result<()> {
    let dir = published_dir();
    let mut archive = Archive::new(ArchiveConfig::new(dir.path()))?;
    assert_eq!(archive.state(IndexKind::Flat), IndexState::Unloaded);
    assert!(matches!(archive.posts_by_range(0, 1), Err(ArchiveError::IndexNotLoaded(IndexKind::Flat))));

    assert_eq!(archive.build_flat_index()?.len(), 3);
    assert_eq!(titles(&archive.posts_by_range(1514618959, 1514618984)?), ["B", "A"]);
    assert_eq!(titles(&archive.posts_by_range(1514618960, 1514618960)?), ["A"]);
    assert!(archive.posts_by_range(1514618961, 1514618961)?.is_empty());
    assert_eq!(titles(&archive.posts_by_tags(&["smash"])?), ["C"]);
    assert_eq!(titles(&archive.posts_by_tags(&["#post", "nintendo"])?), ["C", "B", "A"]);
    assert!(archive.posts_by_tags(&["missing"])?.is_empty());

    let err = archive.posts_by_range(10, 5).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    let no_tags: [&str; 0] = [];
    assert!(matches!(archive.posts_by_tags(&no_tags), Err(ArchiveError::EmptyTagSet)));
    Ok(())
}

#[test]
fn test_calendar_queries() -> blog_archive::Result<()> {
    let dir = published_dir();
    let mut archive = Archive::new(ArchiveConfig::new(dir.path()))?;
    assert!(matches!(archive.build_ymd_index(), Err(ArchiveError::IndexNotLoaded(IndexKind::Flat))));

    archive.build_flat_index()?;
    let ymd = archive.build_ymd_index()?;
    assert_eq!(ymd.len(), 3);
    assert_eq!(ymd.years().collect::<Vec<_>>(), [2018, 2017]);

    assert_eq!(titles(&archive.get_posts_from(2017, Some(12), Some(30))?.flatten()), ["A", "B"]);
    assert_eq!(titles(&archive.get_posts_from(2018, Some(4), None)?.flatten()), ["C"]);
    assert_eq!(archive.get_posts_from(2017, None, None)?.flatten().len(), 2);

    let err = archive.get_posts_from(2016, None, None).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(archive.get_posts_from(2017, Some(11), None).is_err());
    assert!(archive.get_posts_from(2017, Some(12), Some(31)).is_err());
    Ok(())
}

#[test]
fn test_reference_offset_moves_days() -> blog_archive::Result<()> {
    let dir = published_dir();
    let config = ArchiveConfig::new(dir.path()).with_utc_offset(FixedOffset::west_opt(7 * 3600).unwrap());
    let mut archive = Archive::new(config)?;
    archive.build_flat_index()?;
    archive.build_ymd_index()?;

    assert_eq!(titles(&archive.get_posts_from(2018, Some(4), Some(9))?.flatten()), ["C"]);
    assert!(archive.get_posts_from(2018, Some(4), Some(10)).is_err());
    Ok(())
}

#[test]
fn test_duplicate_publish_time() {
    let dir = published_dir();
    write_post(dir.path(), "1514618960_again.md", "#post", "Again");

    let mut archive = Archive::new(ArchiveConfig::new(dir.path())).unwrap();
    let err = archive.build_flat_index().unwrap_err();
    assert!(matches!(err, ArchiveError::DuplicatePublishTime { publish_time: 1514618960, .. }));
    assert_eq!(err.kind(), ErrorKind::Conflict);
    assert_eq!(archive.state(IndexKind::Flat), IndexState::Unloaded);
}

#[test]
fn test_publish_then_reindex() -> blog_archive::Result<()> {
    let content = tempdir().unwrap();
    let drafts = tempdir().unwrap();
    write_post(drafts.path(), "draft.md", "#rust", "Draft");

    let mut archive = Archive::new(ArchiveConfig::new(content.path()))?;
    let post = archive.publish(&drafts.path().join("draft.md"), Some(100))?;
    assert_eq!(post.location(), content.path().join("100_draft.md"));
    assert_eq!(post.publish_time(), 100);
    assert_eq!(post.tags(), ["#rust"]);

    let err = archive.publish(&drafts.path().join("draft.md"), Some(100)).unwrap_err();
    assert!(matches!(err, ArchiveError::Conflict { .. }));
    assert_eq!(fs::read_dir(content.path()).unwrap().count(), 1);

    assert_eq!(titles(&archive.build_flat_index()?.iter().collect::<Vec<_>>()), ["Draft"]);
    Ok(())
}

#[test]
fn test_snapshots_survive_restart() -> blog_archive::Result<()> {
    let dir = published_dir();
    let snapshots = tempdir().unwrap();
    let config = ArchiveConfig::new(dir.path())
        .with_snapshots(snapshots.path().join("flat.json"), snapshots.path().join("ymd.json"));

    let mut archive = PersistentArchive::new(config.clone())?;
    let flat = archive.generate_flat_archive()?.clone();
    let ymd = archive.generate_ymd_archive()?.clone();
    drop(archive);

    // Snapshots only, the content directory is gone
    let empty = tempdir().unwrap();
    let config = ArchiveConfig { content_dir: empty.path().to_path_buf(), ..config };
    let mut restarted = PersistentArchive::new(config)?;
    assert_eq!(restarted.load_flat_archive()?, &flat);
    assert_eq!(restarted.load_ymd_archive()?, &ymd);
    assert_eq!(titles(&restarted.posts_by_tags(&["post"])?), ["B", "A"]);
    Ok(())
}
