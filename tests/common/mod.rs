//! Scripted in-memory grid backend shared by the integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use ttpasm_trace::store::{Grid, GridBackend, MajorDimension, RangeAddress, RetryPolicy, ValueRange};
use ttpasm_trace::utils::BackendError;

/// One scripted answer to a `get`
pub enum Scripted {
    Values(Grid),
    Reset,
}

/// In-memory store with per-range scripted reads and call accounting
///
/// Unscripted reads return the stored cells. Writes overwrite only the cells
/// they cover, like the real service.
#[derive(Default)]
pub struct FakeStore {
    cells: HashMap<RangeAddress, Grid>,
    scripts: HashMap<RangeAddress, VecDeque<Scripted>>,
    update_resets: usize,
    clear_resets: usize,
    auth_resets: usize,
    auth_rejected: bool,
    session: bool,

    pub auth_calls: usize,
    pub get_calls: HashMap<RangeAddress, usize>,
    pub updates: Vec<(RangeAddress, ValueRange)>,
    pub clears: Vec<RangeAddress>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a range with rows
    pub fn with_cells(mut self, address: &RangeAddress, rows: Grid) -> Self {
        self.cells.insert(address.clone(), rows);
        self
    }

    /// Answer the next reads of a range from a script, then fall back to cells
    pub fn with_script(mut self, address: &RangeAddress, script: Vec<Scripted>) -> Self {
        self.scripts.insert(address.clone(), script.into());
        self
    }

    /// Drop the session on the next `count` updates
    pub fn with_update_resets(mut self, count: usize) -> Self {
        self.update_resets = count;
        self
    }

    /// Drop the session on the next `count` clears
    pub fn with_clear_resets(mut self, count: usize) -> Self {
        self.clear_resets = count;
        self
    }

    /// Refuse the connection on the next `count` logins
    pub fn with_auth_resets(mut self, count: usize) -> Self {
        self.auth_resets = count;
        self
    }

    /// Reject every login as bad credentials
    pub fn with_auth_rejected(mut self) -> Self {
        self.auth_rejected = true;
        self
    }

    pub fn gets(&self, address: &RangeAddress) -> usize {
        self.get_calls.get(address).copied().unwrap_or(0)
    }

    pub fn cells(&self, address: &RangeAddress) -> Grid {
        self.cells.get(address).cloned().unwrap_or_default()
    }

    pub fn was_updated(&self, address: &RangeAddress) -> bool {
        self.updates.iter().any(|(a, _)| a == address)
    }

    fn require_session(&self) -> Result<(), BackendError> {
        if self.session {
            Ok(())
        } else {
            Err(BackendError::ConnectionReset("no session".to_string()))
        }
    }
}

impl GridBackend for FakeStore {
    fn authenticate(&mut self) -> Result<(), BackendError> {
        self.auth_calls += 1;

        if self.auth_rejected {
            return Err(BackendError::AuthFailed("invalid_grant".to_string()));
        }
        if self.auth_resets > 0 {
            self.auth_resets -= 1;
            return Err(BackendError::ConnectionReset("refused".to_string()));
        }

        self.session = true;
        Ok(())
    }

    fn get(&mut self, address: &RangeAddress) -> Result<ValueRange, BackendError> {
        self.require_session()?;
        *self.get_calls.entry(address.clone()).or_default() += 1;

        if let Some(next) = self.scripts.get_mut(address).and_then(VecDeque::pop_front) {
            return match next {
                Scripted::Values(values) => Ok(ValueRange::new(values, MajorDimension::Rows)),
                Scripted::Reset => {
                    self.session = false;
                    Err(BackendError::ConnectionReset("scripted reset".to_string()))
                }
            };
        }

        Ok(ValueRange::new(self.cells(address), MajorDimension::Rows))
    }

    fn update(&mut self, address: &RangeAddress, values: &ValueRange) -> Result<(), BackendError> {
        self.require_session()?;

        if self.update_resets > 0 {
            self.update_resets -= 1;
            self.session = false;
            return Err(BackendError::ConnectionReset("scripted reset".to_string()));
        }

        self.updates.push((address.clone(), values.clone()));

        let target = self.cells.entry(address.clone()).or_default();
        for (r, row) in values.clone().into_rows().into_iter().enumerate() {
            if target.len() <= r {
                target.resize(r + 1, Vec::new());
            }
            for (c, cell) in row.into_iter().enumerate() {
                if target[r].len() <= c {
                    target[r].resize(c + 1, String::new());
                }
                target[r][c] = cell;
            }
        }

        Ok(())
    }

    fn clear(&mut self, address: &RangeAddress) -> Result<(), BackendError> {
        self.require_session()?;

        if self.clear_resets > 0 {
            self.clear_resets -= 1;
            self.session = false;
            return Err(BackendError::ConnectionReset("scripted reset".to_string()));
        }

        self.clears.push(address.clone());
        self.cells.remove(address);
        Ok(())
    }
}

/// Build a grid from string slices
pub fn grid(cells: &[&[&str]]) -> Grid {
    cells
        .iter()
        .map(|row| row.iter().map(|c| c.to_string()).collect())
        .collect()
}

/// Retry policy that never sleeps
pub fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::new(max_retries, Duration::ZERO).unwrap()
}
