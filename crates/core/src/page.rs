use serde::{Deserialize, Serialize};

use crate::cursor::{Cursor, HasCursorKey};
use crate::error::{Result, TracedeckError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    #[default]
    Next,
    Previous,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub has_next: bool,
    pub next_cursor: Option<Cursor>,
    pub has_previous: bool,
    pub previous_cursor: Option<Cursor>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            has_next: false,
            next_cursor: None,
            has_previous: false,
            previous_cursor: None,
        }
    }
}

// Select one page from a canonically sorted (created_at desc, id desc) view.
// The view must already be filtered; pagination never sees excluded rows.
pub fn paginate<T>(
    view: &[T],
    limit: usize,
    cursor: Option<&Cursor>,
    direction: Direction,
) -> Result<Page<T>>
where
    T: HasCursorKey + Clone,
{
    if limit == 0 {
        return Err(TracedeckError::InvalidArgument(
            "limit must be positive".to_string(),
        ));
    }

    let start = match cursor {
        None => 0,
        Some(cursor) => match view.iter().position(|item| cursor.matches(item)) {
            Some(idx) => match direction {
                Direction::Next => idx + 1,
                Direction::Previous => idx.saturating_sub(limit),
            },
            None => {
                // the record scrolled out of the store; restart from page 1
                tracing::debug!("stale cursor, restarting from first page");
                0
            }
        },
    };

    let start = start.min(view.len());
    let end = (start + limit).min(view.len());
    let items = view[start..end].to_vec();

    let has_next = end < view.len();
    let has_previous = start > 0;
    let next_cursor = if has_next {
        items.last().map(HasCursorKey::cursor)
    } else {
        None
    };
    let previous_cursor = if has_previous {
        items.first().map(HasCursorKey::cursor)
    } else {
        None
    };

    Ok(Page {
        items,
        has_next,
        next_cursor,
        has_previous,
        previous_cursor,
    })
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use super::*;
    use crate::cursor::{CursorId, sort_canonical};

    #[derive(Debug, Clone, PartialEq)]
    struct Row {
        id: i64,
        created_at: DateTime<Utc>,
    }

    impl HasCursorKey for Row {
        fn created_at(&self) -> DateTime<Utc> {
            self.created_at
        }

        fn cursor_id(&self) -> CursorId {
            CursorId::Int(self.id)
        }
    }

    fn store(n: i64) -> Vec<Row> {
        // id 1 is the newest record, mirroring insertion order in the UI
        let t0 = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let mut rows = (1..=n)
            .map(|id| Row {
                id,
                created_at: t0 - chrono::Duration::seconds(id),
            })
            .collect::<Vec<_>>();
        sort_canonical(&mut rows);
        rows
    }

    #[test]
    fn rejects_zero_limit() {
        let view = store(3);
        assert!(matches!(
            paginate(&view, 0, None, Direction::Next),
            Err(TracedeckError::InvalidArgument(_))
        ));
    }

    #[test]
    fn first_page_then_next_cursor() {
        // the three-record worked example: t3 > t2 > t1, already newest-first
        let view = store(3);
        let page = paginate(&view, 2, None, Direction::Next).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id, 1);
        assert_eq!(page.items[1].id, 2);
        assert!(page.has_next);
        assert!(!page.has_previous);
        let cursor = page.next_cursor.clone().unwrap();
        assert_eq!(cursor.id, CursorId::Int(2));

        let page2 = paginate(&view, 2, Some(&cursor), Direction::Next).unwrap();
        assert_eq!(page2.items.len(), 1);
        assert_eq!(page2.items[0].id, 3);
        assert!(!page2.has_next);
        assert!(page2.has_previous);
        assert!(page2.next_cursor.is_none());
    }

    #[test]
    fn walk_enumerates_every_record_once() {
        let view = store(10);
        let mut seen = Vec::new();
        let mut cursor: Option<Cursor> = None;
        loop {
            let page = paginate(&view, 3, cursor.as_ref(), Direction::Next).unwrap();
            seen.extend(page.items.iter().map(|r| r.id));
            if !page.has_next {
                break;
            }
            cursor = page.next_cursor;
        }
        assert_eq!(seen, (1..=10).collect::<Vec<_>>());
    }

    #[test]
    fn previous_cursor_returns_prior_page() {
        let view = store(9);
        let first = paginate(&view, 3, None, Direction::Next).unwrap();
        let second =
            paginate(&view, 3, first.next_cursor.as_ref(), Direction::Next).unwrap();
        assert!(second.has_previous);

        let back = paginate(
            &view,
            3,
            second.previous_cursor.as_ref(),
            Direction::Previous,
        )
        .unwrap();
        assert_eq!(back.items, first.items);
        assert!(!back.has_previous);
        assert!(back.has_next);
    }

    #[test]
    fn previous_near_top_clips_to_first_page() {
        let view = store(5);
        // cursor on the second-newest record, one full page does not fit above
        let cursor = view[1].cursor();
        let page = paginate(&view, 3, Some(&cursor), Direction::Previous).unwrap();
        assert_eq!(page.items.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert!(!page.has_previous);
        assert!(page.has_next);
    }

    #[test]
    fn stale_cursor_restarts_from_first_page() {
        let view = store(4);
        let stale = Cursor {
            created_at: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
            id: CursorId::Int(99),
        };
        let page = paginate(&view, 2, Some(&stale), Direction::Next).unwrap();
        assert_eq!(page.items[0].id, 1);
        assert!(!page.has_previous);
    }

    #[test]
    fn limit_one_single_record_store() {
        let view = store(1);
        let page = paginate(&view, 1, None, Direction::Next).unwrap();
        assert_eq!(page.items.len(), 1);
        assert!(!page.has_next);
        assert!(!page.has_previous);
        assert!(page.next_cursor.is_none());
        assert!(page.previous_cursor.is_none());
    }

    #[test]
    fn empty_view_yields_empty_page() {
        let view: Vec<Row> = Vec::new();
        let page = paginate(&view, 25, None, Direction::Next).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(!page.has_previous);
    }

    #[test]
    fn next_past_last_record_is_empty_with_has_previous() {
        let view = store(3);
        let cursor = view[2].cursor();
        let page = paginate(&view, 2, Some(&cursor), Direction::Next).unwrap();
        assert!(page.items.is_empty());
        assert!(!page.has_next);
        assert!(page.has_previous);
        assert!(page.previous_cursor.is_none());
    }
}
