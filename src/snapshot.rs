use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::str::FromStr;

use chrono::FixedOffset;
use serde::Serialize;
use spdlog::info;

use crate::error::{ArchiveError, Result};
use crate::flat_index::FlatIndex;
use crate::post::PostFields;
use crate::post_factory::PostFactory;
use crate::ymd_index::{calendar_date, YmdIndex};

type RawFlat = BTreeMap<String, PostFields>;
type RawYmd = BTreeMap<String, BTreeMap<String, BTreeMap<String, Vec<PostFields>>>>;

/// Overwrites `path` with the JSON form of `value`. There is no protection
/// against a crash halfway through; snapshots can always be regenerated from
/// the content directory.
pub fn write_snapshot<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ArchiveError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(value).map_err(|source| ArchiveError::SnapshotEncode {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, json).map_err(|source| ArchiveError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    info!("Wrote snapshot {}", path.display());
    Ok(())
}

pub fn read_flat_snapshot(path: &Path) -> Result<FlatIndex> {
    let raw: RawFlat = read_json(path)?;

    let mut index = FlatIndex::default();
    for (key, fields) in raw {
        let publish_time = parse_key::<i64>(path, &key, "publish time")?;
        if publish_time != fields.publish_time {
            return Err(decode_error(path, format!(
                "key {} does not match publishTime {} of {}",
                key, fields.publish_time, fields.location.display()
            )));
        }
        let post = PostFactory::from_snapshot(fields).map_err(|e| decode_error(path, e.to_string()))?;
        index.insert(post).map_err(|e| decode_error(path, e.to_string()))?;
    }

    info!("Loaded flat index with {} posts from {}", index.len(), path.display());
    Ok(index)
}

/// Reads a year/month/day snapshot. Every post must fall on the date it is
/// filed under, computed in `offset`.
pub fn read_ymd_snapshot(path: &Path, offset: FixedOffset) -> Result<YmdIndex> {
    let raw: RawYmd = read_json(path)?;

    let mut index = YmdIndex::default();
    for (year_key, months) in raw {
        let year = parse_key::<i32>(path, &year_key, "year")?;
        for (month_key, days) in months {
            let month = parse_key::<u32>(path, &month_key, "month").and_then(|m| in_range(path, m, 1..=12, "month"))?;
            for (day_key, posts) in days {
                let day = parse_key::<u32>(path, &day_key, "day").and_then(|d| in_range(path, d, 1..=31, "day"))?;
                for fields in posts {
                    let filed_under = (year, month, day);
                    let date = calendar_date(fields.publish_time, offset).map_err(|e| decode_error(path, e.to_string()))?;
                    if date != filed_under {
                        return Err(decode_error(path, format!(
                            "publishTime {} of {} is not on {}/{}/{}",
                            fields.publish_time, fields.location.display(), year, month, day
                        )));
                    }
                    let post = PostFactory::from_snapshot(fields).map_err(|e| decode_error(path, e.to_string()))?;
                    index.push(filed_under, post);
                }
            }
        }
    }
    index.sort_days();

    info!("Loaded year/month/day index with {} posts from {}", index.len(), path.display());
    Ok(index)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::InvalidData => decode_error(path, e.to_string()),
        _ => ArchiveError::from_io(path, e),
    })?;
    serde_json::from_str(&content).map_err(|e| decode_error(path, e.to_string()))
}

/// Keys must be plain decimal numbers, so `+5` or `05` are rejected.
fn parse_key<T: FromStr + ToString>(path: &Path, key: &str, what: &str) -> Result<T> {
    match key.parse::<T>() {
        Ok(value) if value.to_string() == key => Ok(value),
        _ => Err(decode_error(path, format!("invalid {} key '{}'", what, key))),
    }
}

fn in_range(path: &Path, value: u32, range: std::ops::RangeInclusive<u32>, what: &str) -> Result<u32> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(decode_error(path, format!("{} {} out of range", what, value)))
    }
}

fn decode_error(path: &Path, reason: String) -> ArchiveError {
    ArchiveError::SnapshotDecode {
        path: path.to_path_buf(),
        reason,
    }
}
