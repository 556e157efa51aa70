use chrono::{NaiveDateTime, TimeDelta};
use std::mem::replace;

/// A timestamp grid iterator that yields each timestamp from the start
/// through the end (inclusive), stepping by a fixed interval.
#[derive(Clone, Eq, PartialEq, Copy, Debug)]
pub struct TimeGrid(pub NaiveDateTime, pub NaiveDateTime, pub TimeDelta);

impl Iterator for TimeGrid {
    type Item = NaiveDateTime;
    fn next(&mut self) -> Option<Self::Item> {
        if self.2 <= TimeDelta::zero() {
            return None;
        }
        if self.0 <= self.1 {
            let next = self.0 + self.2;
            Some(replace(&mut self.0, next))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::TimeGrid;
    use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn test_time_grid_iteration() {
        let grid = TimeGrid(ts(0, 0), ts(4, 0), TimeDelta::try_hours(1).unwrap());
        let stamps: Vec<NaiveDateTime> = grid.collect();
        assert_eq!(stamps.len(), 5);
        assert_eq!(stamps[0], ts(0, 0));
        assert_eq!(stamps[4], ts(4, 0));
    }

    #[test]
    fn test_time_grid_single_point() {
        let grid = TimeGrid(ts(12, 0), ts(12, 0), TimeDelta::try_hours(1).unwrap());
        let stamps: Vec<NaiveDateTime> = grid.collect();
        assert_eq!(stamps.len(), 1);
        assert_eq!(stamps[0], ts(12, 0));
    }

    #[test]
    fn test_time_grid_empty() {
        let grid = TimeGrid(ts(12, 0), ts(11, 0), TimeDelta::try_hours(1).unwrap());
        let stamps: Vec<NaiveDateTime> = grid.collect();
        assert_eq!(stamps.len(), 0);
    }

    #[test]
    fn test_time_grid_end_off_grid() {
        // end between grid points: last stamp is the one before it
        let grid = TimeGrid(ts(0, 0), ts(2, 30), TimeDelta::try_hours(1).unwrap());
        let stamps: Vec<NaiveDateTime> = grid.collect();
        assert_eq!(stamps.len(), 3);
        assert_eq!(stamps[2], ts(2, 0));
    }

    #[test]
    fn test_time_grid_zero_step() {
        let grid = TimeGrid(ts(0, 0), ts(4, 0), TimeDelta::zero());
        assert_eq!(grid.count(), 0);
    }
}
