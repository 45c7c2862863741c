//! Scanner Module - Per-listener scan state machine
//!
//! Decides when a burst of keystrokes is a finished scan.
//!
//! ```text
//!   Idle ──first key──▶ PrefixMatching ──prefix done──▶ Buffering ─┐
//!    ▲                         │                            │  ◀───┘ payload char
//!    └────── finish (timer) ◀──┴──────── finish / early ◀───┘
//! ```
//!
//! The scanner owns no timer itself. It records which timer governs the
//! current burst, and the listener arms and cancels it.

use crate::types::ValueTest;

use super::buffer::ScanBuffer;
use super::prefix::{PrefixMatcher, PrefixStep};
use super::timer::TimerId;

/// Where the current burst stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// No burst in progress.
    Idle,
    /// Burst started, prefix not complete yet.
    PrefixMatching,
    /// Prefix complete, collecting payload.
    Buffering,
}

/// A burst finished early because its payload passed the value test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EarlyCompletion {
    pub payload: String,
    /// Timer that must be cancelled so the burst isn't finalized twice.
    pub timer: Option<TimerId>,
}

/// Scan state for one listener.
#[derive(Debug)]
pub struct ScanState {
    matcher: PrefixMatcher,
    buffer: ScanBuffer,
    phase: ScanPhase,
    pending_timer: Option<TimerId>,
    value_test: Option<ValueTest>,
    finish_scan_on_match: bool,
}

impl ScanState {
    pub fn new(prefix: &str, value_test: Option<ValueTest>, finish_scan_on_match: bool) -> Self {
        Self {
            matcher: PrefixMatcher::new(prefix),
            buffer: ScanBuffer::new(),
            phase: ScanPhase::Idle,
            pending_timer: None,
            value_test,
            finish_scan_on_match,
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == ScanPhase::Idle
    }

    /// Payload collected so far in this burst.
    pub fn payload(&self) -> &str {
        self.buffer.as_str()
    }

    pub fn matched_prefix_len(&self) -> usize {
        self.matcher.matched_len()
    }

    pub fn pending_timer(&self) -> Option<TimerId> {
        self.pending_timer
    }

    /// Start a burst governed by `timer`.
    ///
    /// Ignored unless idle: one timer per burst.
    pub fn start_burst(&mut self, timer: TimerId) -> bool {
        if !self.is_idle() {
            return false;
        }
        self.phase = ScanPhase::PrefixMatching;
        self.pending_timer = Some(timer);
        true
    }

    /// Feed one character of the current burst.
    pub fn feed(&mut self, c: char) -> Option<EarlyCompletion> {
        if self.is_idle() {
            return None;
        }

        match self.matcher.feed(c) {
            PrefixStep::Completed => {
                self.phase = ScanPhase::Buffering;
                None
            }
            PrefixStep::Advanced | PrefixStep::Skipped => None,
            PrefixStep::Saturated => {
                if !self.buffer.push(c) || !self.finish_scan_on_match {
                    return None;
                }
                let test = self.value_test.as_ref()?;
                if !test.test(self.buffer.as_str()) {
                    return None;
                }
                let timer = self.pending_timer.take();
                Some(EarlyCompletion {
                    payload: self.reset(),
                    timer,
                })
            }
        }
    }

    /// Finalize the burst when its timer fires.
    ///
    /// Returns the payload if one was collected and passes the value test
    /// (or there is no test). State is reset either way.
    pub fn finish(&mut self) -> Option<String> {
        self.pending_timer = None;
        let payload = self.reset();
        if payload.is_empty() {
            return None;
        }
        match &self.value_test {
            Some(test) if !test.test(&payload) => None,
            _ => Some(payload),
        }
    }

    /// Abandon the burst, handing back its timer for cancellation.
    pub fn abandon(&mut self) -> Option<TimerId> {
        self.reset();
        self.pending_timer.take()
    }

    fn reset(&mut self) -> String {
        self.matcher.reset();
        self.phase = ScanPhase::Idle;
        self.buffer.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::timer::{Scheduler, TimerQueue};

    thread_local! {
        static TIMERS: TimerQueue = TimerQueue::manual();
    }

    fn timer_id() -> TimerId {
        TIMERS.with(|timers| timers.schedule_once(std::time::Duration::ZERO, Box::new(|| {})))
    }

    fn feed_all(state: &mut ScanState, input: &str) -> Option<EarlyCompletion> {
        let mut early = None;
        for c in input.chars() {
            if let Some(done) = state.feed(c) {
                early = Some(done);
            }
        }
        early
    }

    #[test]
    fn test_idle_ignores_characters() {
        let mut state = ScanState::new("L%", None, false);
        assert_eq!(state.feed('L'), None);
        assert_eq!(state.matched_prefix_len(), 0);
    }

    #[test]
    fn test_phases() {
        let mut state = ScanState::new("L%", None, false);
        assert!(state.start_burst(timer_id()));
        assert_eq!(state.phase(), ScanPhase::PrefixMatching);

        feed_all(&mut state, "L%");
        assert_eq!(state.phase(), ScanPhase::Buffering);

        feed_all(&mut state, "12 3");
        assert_eq!(state.payload(), "123");

        assert_eq!(state.finish(), Some("123".to_string()));
        assert!(state.is_idle());
        assert_eq!(state.matched_prefix_len(), 0);
        assert_eq!(state.pending_timer(), None);
    }

    #[test]
    fn test_second_burst_start_ignored() {
        let mut state = ScanState::new("L%", None, false);
        let first = timer_id();
        let second = timer_id();
        assert_ne!(first, second);
        assert!(state.start_burst(first));
        assert!(!state.start_burst(second));
        assert_eq!(state.pending_timer(), Some(first));
    }

    #[test]
    fn test_finish_without_payload() {
        let mut state = ScanState::new("L%", None, false);
        state.start_burst(timer_id());
        feed_all(&mut state, "L%   ");
        assert_eq!(state.finish(), None);
        assert!(state.is_idle());
    }

    #[test]
    fn test_finish_applies_value_test() {
        let test = ValueTest::pattern("^123.*").unwrap();
        let mut state = ScanState::new("L%", Some(test), false);

        state.start_burst(timer_id());
        feed_all(&mut state, "L%999");
        assert_eq!(state.finish(), None);

        state.start_burst(timer_id());
        feed_all(&mut state, "L%123abc");
        assert_eq!(state.finish(), Some("123abc".to_string()));
    }

    #[test]
    fn test_early_completion() {
        let test = ValueTest::pattern("^123.*").unwrap();
        let mut state = ScanState::new("L%", Some(test), true);
        let timer = timer_id();
        state.start_burst(timer);

        assert_eq!(feed_all(&mut state, "L%12"), None);
        let done = state.feed('3').unwrap();
        assert_eq!(done.payload, "123");
        assert_eq!(done.timer, Some(timer));
        assert!(state.is_idle());

        // Rest of the burst is ignored until a new burst starts
        assert_eq!(feed_all(&mut state, "blabla"), None);
    }

    #[test]
    fn test_finish_on_match_without_test_waits() {
        let mut state = ScanState::new("L%", None, true);
        state.start_burst(timer_id());
        assert_eq!(feed_all(&mut state, "L%123"), None);
        assert_eq!(state.finish(), Some("123".to_string()));
    }

    #[test]
    fn test_abandon_returns_timer() {
        let mut state = ScanState::new("L%", None, false);
        let timer = timer_id();
        state.start_burst(timer);
        feed_all(&mut state, "L%1");
        assert_eq!(state.abandon(), Some(timer));
        assert!(state.is_idle());
        assert_eq!(state.payload(), "");
    }
}
