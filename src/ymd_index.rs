use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, FixedOffset};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use spdlog::info;

use crate::error::{ArchiveError, Result};
use crate::flat_index::FlatIndex;
use crate::post::Post;

/// day -> posts of that day, oldest first
pub type MonthPosts = BTreeMap<u32, Vec<Post>>;
/// month -> days
pub type YearPosts = BTreeMap<u32, MonthPosts>;

/// Posts filed by the calendar date of their publish time.
///
/// Dates are computed in a fixed UTC offset given at build time, so the same
/// content directory produces the same tree on every machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct YmdIndex {
    years: BTreeMap<i32, YearPosts>,
}

/// What [`YmdIndex::get`] finds, depending on how deep the lookup went.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PostsFrom<'a> {
    Year(&'a YearPosts),
    Month(&'a MonthPosts),
    Day(&'a [Post]),
}

impl<'a> PostsFrom<'a> {
    /// Every post of the fragment, oldest first.
    pub fn flatten(&self) -> Vec<&'a Post> {
        match *self {
            PostsFrom::Year(months) => months.values()
                .flat_map(|days| days.values())
                .flatten()
                .collect(),
            PostsFrom::Month(days) => days.values().flatten().collect(),
            PostsFrom::Day(posts) => posts.iter().collect(),
        }
    }
}

impl YmdIndex {
    pub fn build(flat: &FlatIndex, offset: FixedOffset) -> Result<YmdIndex> {
        let mut index = YmdIndex::default();
        for post in flat.iter() {
            let date = calendar_date(post.publish_time(), offset)?;
            index.push(date, post.clone());
        }
        index.sort_days();

        info!("Built year/month/day index with {} posts in {} years", index.len(), index.years.len());
        Ok(index)
    }

    pub(crate) fn push(&mut self, (year, month, day): (i32, u32, u32), post: Post) {
        self.years.entry(year)
            .or_default()
            .entry(month)
            .or_default()
            .entry(day)
            .or_default()
            .push(post);
    }

    pub(crate) fn sort_days(&mut self) {
        for months in self.years.values_mut() {
            for days in months.values_mut() {
                for posts in days.values_mut() {
                    posts.sort_by_key(|post| post.publish_time());
                }
            }
        }
    }

    /// Looks up a year, then optionally a month of it, then optionally a day
    /// of that month. `day` is only considered together with `month`.
    pub fn get(&self, year: i32, month: Option<u32>, day: Option<u32>) -> Result<PostsFrom<'_>> {
        let months = self.years.get(&year)
            .ok_or(ArchiveError::PostNotFound { year, month: None, day: None })?;

        let Some(month) = month else {
            return Ok(PostsFrom::Year(months));
        };

        let days = months.get(&month)
            .ok_or(ArchiveError::PostNotFound { year, month: Some(month), day: None })?;

        let Some(day) = day else {
            return Ok(PostsFrom::Month(days));
        };

        days.get(&day)
            .map(|posts| PostsFrom::Day(posts.as_slice()))
            .ok_or(ArchiveError::PostNotFound { year, month: Some(month), day: Some(day) })
    }

    /// Years present in the index, most recent first.
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().rev().copied()
    }

    /// Number of posts across all days.
    pub fn len(&self) -> usize {
        self.years.values()
            .flat_map(|months| months.values())
            .flat_map(|days| days.values())
            .map(|posts| posts.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl Serialize for YmdIndex {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.years.len()))?;
        for (year, months) in self.years.iter().rev() {
            map.serialize_entry(&year.to_string(), months)?;
        }
        map.end()
    }
}

/// Year, month (1-12) and day (1-31) of `publish_time` in `offset`.
pub fn calendar_date(publish_time: i64, offset: FixedOffset) -> Result<(i32, u32, u32)> {
    let date_time = DateTime::from_timestamp(publish_time, 0)
        .ok_or(ArchiveError::DateDerivation { publish_time })?
        .with_timezone(&offset);
    Ok((date_time.year(), date_time.month(), date_time.day()))
}
