//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Fixed-size page windows over a filtered listing collection

use serde::{Deserialize, Serialize};

/// Listings per page. Clients cannot change it.
pub const PAGE_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageRequest {
    number: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (sign, digits) = match s.as_bytes().first() {
        Some(b'-') => (-1, &s[1..]),
        Some(b'+') => (1, &s[1..]),
        _ => (1, s),
    };
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

impl PageRequest {
    pub const fn first() -> Self {
        Self { number: 1 }
    }

    /// Page numbers at or below zero select the first page
    pub fn new(number: i64) -> Self {
        match usize::try_from(number) {
            Ok(number) if number > 0 => Self { number },
            _ => Self::first(),
        }
    }

    /// Reads a leading signed integer, so `"2.5"` is page 2.
    /// Absent or unparsable input selects the first page
    pub fn parse(raw: Option<&str>) -> Self {
        raw.and_then(leading_integer).map_or_else(Self::first, Self::new)
    }

    /// Reads the last `page` key of a raw query string
    pub fn from_query_pairs<'a, I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let raw = pairs
            .into_iter()
            .filter(|(k, _)| *k == "page")
            .map(|(_, v)| v)
            .last();
        Self::parse(raw)
    }

    pub fn number(&self) -> usize {
        self.number
    }

    pub fn skip(&self) -> usize {
        (self.number - 1).saturating_mul(PAGE_SIZE)
    }

    pub fn limit(&self) -> usize {
        PAGE_SIZE
    }

    pub fn next(&self) -> Self {
        Self {
            number: self.number.saturating_add(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
pub struct Pagination {
    pub total: usize,
    pub page: usize,
    pub pages: usize,
}

impl Pagination {
    pub fn new(total: usize, page: PageRequest) -> Self {
        Self {
            total,
            page: page.number(),
            pages: total.div_ceil(PAGE_SIZE),
        }
    }
}

/// One window of results plus the total count under the same filter.
///
/// Window and count are read separately, so `pagination.total` may disagree
/// with `data` when the catalog changes between the two reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "server", derive(schemars::JsonSchema))]
pub struct PageResult<T> {
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> PageResult<T> {
    pub fn new(data: Vec<T>, total: usize, page: PageRequest) -> Self {
        Self {
            data,
            pagination: Pagination::new(total, page),
        }
    }

    pub fn empty(page: PageRequest) -> Self {
        Self::new(Vec::new(), 0, page)
    }

    pub fn has_more(&self) -> bool {
        self.pagination.page < self.pagination.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_or_garbage_pages_are_first() {
        for raw in [None, Some(""), Some("0"), Some("-4"), Some("abc"), Some("-"), Some("+")] {
            assert_eq!(PageRequest::parse(raw), PageRequest::first(), "{raw:?}");
        }
        assert_eq!(PageRequest::parse(Some(" 3 ")).number(), 3);
        assert_eq!(PageRequest::new(i64::MIN).number(), 1);
    }

    #[test]
    fn leading_digits_select_the_page() {
        assert_eq!(PageRequest::parse(Some("2.5")).number(), 2);
        assert_eq!(PageRequest::parse(Some("3abc")).number(), 3);
        assert_eq!(PageRequest::parse(Some("+4")).number(), 4);
        assert_eq!(PageRequest::parse(Some("-2.5")).number(), 1);
    }

    #[test]
    fn skip_follows_page_size() {
        assert_eq!(PageRequest::first().skip(), 0);
        assert_eq!(PageRequest::new(2).skip(), 5);
        assert_eq!(PageRequest::new(7).skip(), 30);
        assert_eq!(PageRequest::new(7).next().number(), 8);
    }

    #[test]
    fn page_count_is_ceiling_of_total() {
        for total in 0..=26 {
            let pagination = Pagination::new(total, PageRequest::first());
            let expected = if total == 0 { 0 } else { (total - 1) / PAGE_SIZE + 1 };
            assert_eq!(pagination.pages, expected, "total={total}");
        }
    }

    #[test]
    fn last_page_key_wins() {
        let page = PageRequest::from_query_pairs([("page", "2"), ("destination", "x"), ("page", "4")]);
        assert_eq!(page.number(), 4);
    }
}
