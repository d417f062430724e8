//! On-air selection.
//!
//! Once per tick the station hands every stored record's time window to
//! [`OnAir::on_tick`], in arrival order. The machine decides which record is
//! displayed and which records have expired. It performs no I/O; the
//! returned [`ScheduleAction`]s are carried out by the caller.

use chrono::NaiveDateTime;
use pagecast_types::{PageRecord, RecordId};

/// Time window of one stored record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    /// Record ID.
    pub id: RecordId,
    /// Window start.
    pub start: NaiveDateTime,
    /// Window end (inclusive).
    pub end: NaiveDateTime,
}

impl Window {
    /// Window of `record`.
    pub fn of(record: &PageRecord) -> Self {
        Self {
            id: record.id(),
            start: record.timestamp(),
            end: record.end(),
        }
    }

    /// Whether `now` lies in `[start, end]`.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        self.start <= now && now <= self.end
    }

    /// Whether `now` is strictly past `end`.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        now > self.end
    }
}

/// Instruction for the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleAction {
    /// Blank the display.
    Clear,
    /// Display the record with this ID.
    Show {
        /// Record to display.
        id: RecordId,
    },
    /// Remove the record with this ID from the store.
    Evict {
        /// Record to remove.
        id: RecordId,
    },
}

/// The display slot: nothing, or exactly one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnAir {
    /// Nothing displayed.
    #[default]
    Idle,
    /// A record is displayed.
    Showing {
        /// Displayed record.
        id: RecordId,
        /// Its window start, used for newer-wins comparisons.
        start: NaiveDateTime,
    },
}

impl OnAir {
    /// Start with nothing displayed.
    pub fn new() -> Self {
        Self::Idle
    }

    /// Displayed record, if any.
    pub fn selected(&self) -> Option<RecordId> {
        match self {
            OnAir::Idle => None,
            OnAir::Showing { id, .. } => Some(*id),
        }
    }

    /// Run one tick over `windows` (arrival order).
    ///
    /// An active window is selected when nothing is shown, and replaces the
    /// shown record only if it starts strictly later. Expired windows are
    /// evicted; evicting the shown record clears the display. The selection
    /// evolves while visiting, so a later window can take over from an
    /// earlier one that expired in the same tick.
    pub fn on_tick(self, now: NaiveDateTime, windows: &[Window]) -> (Self, Vec<ScheduleAction>) {
        let mut state = self;
        let mut actions = Vec::new();
        let mut selected_seen = false;

        for window in windows {
            let is_selected = state.selected() == Some(window.id);
            if window.is_active_at(now) {
                match state {
                    OnAir::Idle => {
                        state = OnAir::Showing {
                            id: window.id,
                            start: window.start,
                        };
                        actions.push(ScheduleAction::Show { id: window.id });
                        selected_seen = true;
                    }
                    OnAir::Showing { id, start } if id != window.id && window.start > start => {
                        state = OnAir::Showing {
                            id: window.id,
                            start: window.start,
                        };
                        actions.push(ScheduleAction::Clear);
                        actions.push(ScheduleAction::Show { id: window.id });
                        selected_seen = true;
                    }
                    OnAir::Showing { .. } => {
                        selected_seen |= is_selected;
                    }
                }
            } else if window.is_expired_at(now) {
                actions.push(ScheduleAction::Evict { id: window.id });
                if is_selected {
                    state = OnAir::Idle;
                    actions.push(ScheduleAction::Clear);
                }
            } else if is_selected {
                // Not yet active (clock moved backwards): take it off air but keep it.
                state = OnAir::Idle;
                actions.push(ScheduleAction::Clear);
            }
        }

        if !selected_seen && state != OnAir::Idle {
            state = OnAir::Idle;
            actions.push(ScheduleAction::Clear);
        }

        (state, actions)
    }

    /// Rendering was switched off: drop any selection.
    pub fn on_disabled(self) -> (Self, Vec<ScheduleAction>) {
        match self {
            OnAir::Idle => (OnAir::Idle, Vec::new()),
            OnAir::Showing { .. } => (OnAir::Idle, vec![ScheduleAction::Clear]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1)
            .unwrap()
            .and_hms_opt(12, m, s)
            .unwrap()
    }

    fn window(id: i32, start: NaiveDateTime, secs: i64) -> Window {
        Window {
            id: RecordId::new(id),
            start,
            end: start + chrono::TimeDelta::seconds(secs),
        }
    }

    fn show(id: i32) -> ScheduleAction {
        ScheduleAction::Show {
            id: RecordId::new(id),
        }
    }

    fn evict(id: i32) -> ScheduleAction {
        ScheduleAction::Evict {
            id: RecordId::new(id),
        }
    }

    #[test]
    fn selects_first_active_window() {
        let windows = [window(1, at(0, 0), 60)];
        let (state, actions) = OnAir::new().on_tick(at(0, 30), &windows);
        assert_eq!(state.selected(), Some(RecordId::new(1)));
        assert_eq!(actions, vec![show(1)]);
    }

    #[test]
    fn future_window_is_ignored() {
        let windows = [window(1, at(5, 0), 60)];
        let (state, actions) = OnAir::new().on_tick(at(0, 0), &windows);
        assert_eq!(state, OnAir::Idle);
        assert!(actions.is_empty());
    }

    #[test]
    fn steady_state_produces_no_actions() {
        let windows = [window(1, at(0, 0), 60)];
        let (state, _) = OnAir::new().on_tick(at(0, 10), &windows);
        let (state, actions) = state.on_tick(at(0, 11), &windows);
        assert_eq!(state.selected(), Some(RecordId::new(1)));
        assert!(actions.is_empty());
    }

    #[test]
    fn newer_window_wins_regardless_of_order() {
        let a = window(1, at(0, 0), 120);
        let b = window(2, at(0, 30), 120);
        for windows in [[a, b], [b, a]] {
            let (state, _) = OnAir::new().on_tick(at(1, 0), &windows);
            assert_eq!(state.selected(), Some(RecordId::new(2)));
        }
    }

    #[test]
    fn switching_clears_first() {
        let a = window(1, at(0, 0), 120);
        let (state, _) = OnAir::new().on_tick(at(0, 10), &[a]);
        let b = window(2, at(0, 30), 120);
        let (state, actions) = state.on_tick(at(0, 40), &[a, b]);
        assert_eq!(state.selected(), Some(RecordId::new(2)));
        assert_eq!(actions, vec![ScheduleAction::Clear, show(2)]);
    }

    #[test]
    fn equal_start_never_preempts() {
        let a = window(1, at(0, 0), 120);
        let b = window(2, at(0, 0), 120);
        let (state, _) = OnAir::new().on_tick(at(0, 10), &[a, b]);
        assert_eq!(state.selected(), Some(RecordId::new(1)));
    }

    #[test]
    fn older_window_never_preempts() {
        let newer = window(2, at(0, 30), 120);
        let older = window(1, at(0, 0), 120);
        let (state, _) = OnAir::new().on_tick(at(0, 40), &[newer, older]);
        assert_eq!(state.selected(), Some(RecordId::new(2)));
    }

    #[test]
    fn window_end_is_inclusive() {
        let windows = [window(1, at(0, 0), 60)];
        let (state, actions) = OnAir::new().on_tick(at(1, 0), &windows);
        assert_eq!(state.selected(), Some(RecordId::new(1)));
        assert_eq!(actions, vec![show(1)]);
    }

    #[test]
    fn expired_window_is_evicted() {
        let windows = [window(1, at(0, 0), 60)];
        let (state, actions) = OnAir::new().on_tick(at(1, 1), &windows);
        assert_eq!(state, OnAir::Idle);
        assert_eq!(actions, vec![evict(1)]);
    }

    #[test]
    fn expiry_of_selected_clears() {
        let windows = [window(1, at(0, 0), 60)];
        let (state, _) = OnAir::new().on_tick(at(0, 30), &windows);
        let (state, actions) = state.on_tick(at(2, 0), &windows);
        assert_eq!(state, OnAir::Idle);
        assert_eq!(actions, vec![evict(1), ScheduleAction::Clear]);
    }

    #[test]
    fn later_window_takes_over_after_expiry_in_same_tick() {
        let old = window(1, at(0, 0), 10);
        let next = window(2, at(0, 0), 600);
        let (state, _) = OnAir::new().on_tick(at(0, 5), &[old, next]);
        assert_eq!(state.selected(), Some(RecordId::new(1)));

        let (state, actions) = state.on_tick(at(0, 20), &[old, next]);
        assert_eq!(state.selected(), Some(RecordId::new(2)));
        assert_eq!(actions, vec![evict(1), ScheduleAction::Clear, show(2)]);
    }

    #[test]
    fn selected_window_missing_from_store_clears() {
        let a = window(1, at(0, 0), 60);
        let (state, _) = OnAir::new().on_tick(at(0, 5), &[a]);
        let (state, actions) = state.on_tick(at(0, 6), &[]);
        assert_eq!(state, OnAir::Idle);
        assert_eq!(actions, vec![ScheduleAction::Clear]);
    }

    #[test]
    fn clock_going_back_clears_without_evicting() {
        let a = window(1, at(0, 30), 60);
        let (state, _) = OnAir::new().on_tick(at(0, 40), &[a]);
        let (state, actions) = state.on_tick(at(0, 10), &[a]);
        assert_eq!(state, OnAir::Idle);
        assert_eq!(actions, vec![ScheduleAction::Clear]);
    }

    #[test]
    fn selection_always_active() {
        let windows: Vec<Window> = (0..20)
            .map(|i| window(i, at(0, 0) + chrono::TimeDelta::seconds(i64::from(i) * 7), 30))
            .collect();
        let mut state = OnAir::new();
        let mut live = windows.clone();
        for t in 0..200 {
            let now = at(0, 0) + chrono::TimeDelta::seconds(t);
            let (next, actions) = state.on_tick(now, &live);
            state = next;
            for action in actions {
                if let ScheduleAction::Evict { id } = action {
                    live.retain(|w| w.id != id);
                }
            }
            if let Some(id) = state.selected() {
                let w = live.iter().find(|w| w.id == id).unwrap();
                assert!(w.is_active_at(now));
            }
        }
        assert!(live.is_empty());
    }

    #[test]
    fn disabling_clears_selection() {
        let (state, _) = OnAir::new().on_tick(at(0, 5), &[window(1, at(0, 0), 60)]);
        let (state, actions) = state.on_disabled();
        assert_eq!(state, OnAir::Idle);
        assert_eq!(actions, vec![ScheduleAction::Clear]);
        assert!(OnAir::Idle.on_disabled().1.is_empty());
    }
}
