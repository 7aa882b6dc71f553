//! The board's guarded state: grid, turn records, waiters, and watchers.
//!
//! Everything in this module is synchronous and runs inside the board mutex;
//! the async choreography (suspending waiters, retrying flips) lives in
//! [`super::Board`].

use rand::Rng;
use std::collections::HashMap;
use tokio::sync::oneshot;

use super::errors::FlipError;
use super::grid::{Coord, Grid, PlayerId};
use super::turn::{FlipAttempt, PlayerRecord};

/// A player suspended inside a flip, queued on one cell.
#[derive(Debug)]
struct Waiter {
    player: PlayerId,
    signal: oneshot::Sender<()>,
}

#[derive(Debug)]
pub(crate) struct BoardState {
    grid: Grid,
    players: HashMap<PlayerId, PlayerRecord>,
    waiters: HashMap<Coord, Vec<Waiter>>,
    watchers: Vec<oneshot::Sender<()>>,
}

impl BoardState {
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            players: HashMap::new(),
            waiters: HashMap::new(),
            watchers: Vec::new(),
        }
    }

    pub fn render(&self, viewer: &PlayerId) -> String {
        self.grid.render(viewer)
    }

    /// Registers a watcher fulfilled on the next change event.
    pub fn subscribe(&mut self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.watchers.push(tx);
        rx
    }

    /// Copies out every present label, row-major, for a map compute phase.
    pub fn present_labels(&self) -> Vec<(Coord, String)> {
        self.grid
            .coords()
            .filter_map(|coord| {
                let label = self.grid.cell(coord).label.clone()?;
                Some((coord, label))
            })
            .collect()
    }

    /// Atomically overwrites the labels of the listed cells, skipping any
    /// that were emptied since the labels were copied out. Face-up bits and
    /// controllers are untouched. Announced as a single change event.
    pub fn apply_rewrites(&mut self, rewrites: Vec<(Coord, String)>) {
        for (coord, label) in rewrites {
            assert!(
                !label.is_empty() && !label.chars().any(char::is_whitespace),
                "rewritten labels must be non-empty and whitespace-free"
            );
            let cell = self.grid.cell_mut(coord);
            if cell.label.is_some() {
                cell.label = Some(label);
            }
        }
        self.emit_change();
    }

    /// Step A of a flip: settle `player`'s previous turn before the new flip.
    ///
    /// A two-card record is a finished turn: remove the pair if the labels
    /// still match, otherwise hide whatever is still face up and idle. A
    /// one-card record whose cell the player no longer controls is a first
    /// card relinquished by a failed second flip; hide it now. A one-card
    /// record still under the player's control is an open turn and stays.
    pub fn finalize_previous(&mut self, player: &PlayerId) {
        let positions: Vec<Coord> = match self.players.get(player) {
            Some(record) => record.positions().to_vec(),
            None => return,
        };
        match positions[..] {
            [] => {}
            [held] => {
                if self.grid.cell(held).controller.as_ref() == Some(player) {
                    return;
                }
                let changed = self.hide_if_idle(held);
                self.record_mut(player).clear();
                if changed {
                    self.emit_change();
                }
                self.wake_one_waiter(held);
            }
            [first, second] => {
                let labels_match = {
                    let a = self.grid.cell(first).label.as_deref();
                    let b = self.grid.cell(second).label.as_deref();
                    matches!((a, b), (Some(a), Some(b)) if a == b)
                };
                self.record_mut(player).clear();
                if labels_match {
                    for coord in [first, second] {
                        let cell = self.grid.cell_mut(coord);
                        cell.label = None;
                        cell.face_up = false;
                        cell.controller = None;
                    }
                    log::debug!("{player} finalized a match at {first:?}/{second:?}");
                    self.emit_change();
                } else {
                    let mut changed = false;
                    for coord in [first, second] {
                        let cell = self.grid.cell_mut(coord);
                        if cell.controller.as_ref() == Some(player) {
                            cell.controller = None;
                        }
                        if cell.label.is_some() && cell.face_up && cell.controller.is_none() {
                            cell.face_up = false;
                            changed = true;
                        }
                    }
                    log::trace!("{player} finalized a mismatch at {first:?}/{second:?}");
                    if changed {
                        self.emit_change();
                    }
                }
                self.wake_one_waiter(first);
                self.wake_one_waiter(second);
            }
            _ => unreachable!("turn records never hold more than two cards"),
        }
    }

    /// Step B of a flip: attempt to take the card at `(row, col)`.
    ///
    /// The record is created here on a player's first ever flip.
    pub fn attempt(&mut self, player: &PlayerId, row: usize, col: usize) -> FlipAttempt {
        let positions: Vec<Coord> = self
            .players
            .entry(player.clone())
            .or_default()
            .positions()
            .to_vec();
        match positions[..] {
            [] => self.attempt_first(player, row, col),
            [held] => self.attempt_second(player, held, row, col),
            _ => FlipAttempt::Retry,
        }
    }

    /// First card of a new turn.
    fn attempt_first(&mut self, player: &PlayerId, row: usize, col: usize) -> FlipAttempt {
        let coord = (row, col);
        if !self.grid.contains(coord) {
            return FlipAttempt::Failed(FlipError::InvalidCoordinates { row, col });
        }
        if self.grid.cell(coord).label.is_none() {
            return FlipAttempt::Failed(FlipError::NoCardHere { row, col });
        }
        match self.grid.cell(coord).controller.clone() {
            Some(owner) if owner != *player => {
                let (tx, rx) = oneshot::channel();
                self.waiters.entry(coord).or_default().push(Waiter {
                    player: player.clone(),
                    signal: tx,
                });
                log::debug!("{player} waiting on {coord:?} held by {owner}");
                FlipAttempt::Wait(rx)
            }
            Some(_) => {
                // a wake already reserved this cell for us; just record it
                self.record_mut(player).push(coord);
                FlipAttempt::Acquired
            }
            None => {
                let cell = self.grid.cell_mut(coord);
                cell.face_up = true;
                cell.controller = Some(player.clone());
                self.record_mut(player).push(coord);
                log::debug!("{player} took first card at {coord:?}");
                self.emit_change();
                FlipAttempt::Acquired
            }
        }
    }

    /// Second card of a turn; `held` is the first card's position.
    fn attempt_second(
        &mut self,
        player: &PlayerId,
        held: Coord,
        row: usize,
        col: usize,
    ) -> FlipAttempt {
        let coord = (row, col);
        if !self.grid.contains(coord) {
            return FlipAttempt::Failed(FlipError::InvalidCoordinates { row, col });
        }
        if self.grid.cell(coord).label.is_none() {
            self.relinquish_first(player, held);
            return FlipAttempt::Failed(FlipError::NoCardHere { row, col });
        }
        {
            let target = self.grid.cell(coord);
            if target.face_up && target.controller.is_some() {
                self.relinquish_first(player, held);
                return FlipAttempt::Failed(FlipError::TargetControlled { row, col });
            }
        }
        let cell = self.grid.cell_mut(coord);
        cell.face_up = true;
        cell.controller = Some(player.clone());
        let labels_match = self.grid.cell(held).label == self.grid.cell(coord).label;
        self.record_mut(player).push(coord);
        if labels_match {
            log::debug!("{player} matched {held:?} with {coord:?}");
            self.emit_change();
        } else {
            // Both cards stay face up until the player's next flip, but the
            // first becomes contested right away: its waiters may take over
            // immediately, while the second's waiters wait for finalization.
            self.grid.cell_mut(held).controller = None;
            self.grid.cell_mut(coord).controller = None;
            log::debug!("{player} mismatched {held:?} with {coord:?}");
            self.emit_change();
            self.wake_one_waiter(held);
        }
        FlipAttempt::Acquired
    }

    /// Gives up the first card after a failed second flip. The card stays
    /// face up and in the player's record; its waiters are woken by Step A of
    /// the player's next flip.
    fn relinquish_first(&mut self, player: &PlayerId, held: Coord) {
        let cell = self.grid.cell_mut(held);
        if cell.controller.as_ref() == Some(player) {
            cell.controller = None;
        }
        log::trace!("{player} relinquished {held:?}");
    }

    /// Wakes at most one waiter queued on `coord`, chosen uniformly at
    /// random. If the cell still holds a card, ownership transfers to the
    /// woken player before the signal fires, so no third party can slip in
    /// between wake and resume; on an emptied cell the waiter is woken
    /// bare and its retry fails.
    ///
    /// A cell some player controls is not ours to hand over: a deferred wake
    /// can run after another player legitimately took the card, or after an
    /// earlier wake already reserved it. In that case the waiters stay
    /// queued until the current controller releases the cell.
    fn wake_one_waiter(&mut self, coord: Coord) {
        let Some(queue) = self.waiters.get_mut(&coord) else {
            return;
        };
        if queue.is_empty() {
            self.waiters.remove(&coord);
            return;
        }
        if self.grid.cell(coord).controller.is_some() {
            return;
        }
        let picked = queue.swap_remove(rand::thread_rng().gen_range(0..queue.len()));
        if queue.is_empty() {
            self.waiters.remove(&coord);
        }
        let cell = self.grid.cell_mut(coord);
        if cell.label.is_some() {
            cell.face_up = true;
            cell.controller = Some(picked.player.clone());
            log::debug!("woke {} with {coord:?} reserved", picked.player);
            self.emit_change();
        } else {
            log::debug!("woke {} on emptied {coord:?}", picked.player);
        }
        let _ = picked.signal.send(());
    }

    /// Broadcasts a change event: every queued watcher is fulfilled. Watchers
    /// registered afterwards see only later events.
    fn emit_change(&mut self) {
        for watcher in self.watchers.drain(..) {
            let _ = watcher.send(());
        }
    }

    /// Turns a still-present, face-up, uncontrolled card face down.
    fn hide_if_idle(&mut self, coord: Coord) -> bool {
        let cell = self.grid.cell_mut(coord);
        if cell.label.is_some() && cell.face_up && cell.controller.is_none() {
            cell.face_up = false;
            true
        } else {
            false
        }
    }

    fn record_mut(&mut self, player: &PlayerId) -> &mut PlayerRecord {
        self.players
            .get_mut(player)
            .expect("player record exists once a flip has begun")
    }

    /// Asserts the representation invariants. Violations are programmer
    /// errors and abort the process.
    pub fn check_invariants(&self) {
        let mut held_counts: HashMap<&PlayerId, usize> = HashMap::new();
        for coord in self.grid.coords() {
            let cell = self.grid.cell(coord);
            if cell.label.is_none() {
                assert!(
                    !cell.face_up && cell.controller.is_none(),
                    "an empty cell must be face down and uncontrolled"
                );
            }
            if let Some(owner) = &cell.controller {
                *held_counts.entry(owner).or_insert(0) += 1;
                let listed = self
                    .players
                    .get(owner)
                    .is_some_and(|record| record.positions().contains(&coord));
                assert!(
                    listed || cell.face_up,
                    "a controlled cell is in its owner's record or face up awaiting pickup"
                );
            }
        }
        for count in held_counts.values() {
            assert!(*count <= 2, "no player controls more than two cells");
        }
        for record in self.players.values() {
            assert!(record.positions().len() <= 2);
            for &coord in record.positions() {
                assert!(
                    self.grid.contains(coord),
                    "recorded positions stay in range"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(name: &str) -> PlayerId {
        PlayerId::new(name)
    }

    /// 2x2 board: A A / B B.
    fn state() -> BoardState {
        let grid = Grid::new(
            2,
            2,
            vec!["A", "A", "B", "B"].into_iter().map(String::from).collect(),
        );
        BoardState::new(grid)
    }

    fn acquire(state: &mut BoardState, player: &PlayerId, row: usize, col: usize) {
        state.finalize_previous(player);
        match state.attempt(player, row, col) {
            FlipAttempt::Acquired => {}
            other => panic!("expected acquisition, got {other:?}"),
        }
        state.check_invariants();
    }

    #[test]
    fn first_flip_turns_card_face_up_and_notifies_watchers() {
        let mut state = state();
        let alice = pid("alice");
        let mut watcher = state.subscribe();

        acquire(&mut state, &alice, 0, 0);
        assert_eq!(state.render(&alice), "2x2\nmy A\ndown\ndown\ndown\n");
        watcher.try_recv().expect("acquisition is a change event");
    }

    #[test]
    fn waiter_is_woken_with_ownership_reserved() {
        let mut state = state();
        let (alice, bob) = (pid("alice"), pid("bob"));

        acquire(&mut state, &alice, 0, 0);
        let mut signal = match state.attempt(&bob, 0, 0) {
            FlipAttempt::Wait(rx) => rx,
            other => panic!("expected wait, got {other:?}"),
        };
        assert!(signal.try_recv().is_err());

        // alice mismatches: her first card transfers to bob immediately
        acquire(&mut state, &alice, 1, 0);
        signal.try_recv().expect("mismatch wakes the first card's waiter");
        assert_eq!(state.render(&bob), "2x2\nmy A\ndown\nup B\ndown\n");

        // bob's retry observes the reservation and records the card
        match state.attempt(&bob, 0, 0) {
            FlipAttempt::Acquired => {}
            other => panic!("expected acquisition, got {other:?}"),
        }
        state.check_invariants();
        assert_eq!(state.render(&bob), "2x2\nmy A\ndown\nup B\ndown\n");
    }

    #[test]
    fn failed_second_flip_relinquishes_and_defers_the_wake() {
        let mut state = state();
        let (alice, bob) = (pid("alice"), pid("bob"));

        acquire(&mut state, &alice, 0, 0);
        let mut signal = match state.attempt(&bob, 0, 0) {
            FlipAttempt::Wait(rx) => rx,
            other => panic!("expected wait, got {other:?}"),
        };

        // alice's second flip lands on her own face-up card and fails
        state.finalize_previous(&alice);
        match state.attempt(&alice, 0, 0) {
            FlipAttempt::Failed(FlipError::TargetControlled { row: 0, col: 0 }) => {}
            other => panic!("expected TargetControlled, got {other:?}"),
        }
        state.check_invariants();

        // the card is uncontrolled but bob stays queued until alice moves
        assert_eq!(state.render(&bob), "2x2\nup A\ndown\ndown\ndown\n");
        assert!(signal.try_recv().is_err());

        // alice's next flip finalizes: bob wakes owning the card
        acquire(&mut state, &alice, 1, 0);
        signal.try_recv().expect("finalization wakes the waiter");
        assert_eq!(state.render(&bob), "2x2\nmy A\ndown\nup B\ndown\n");
    }

    #[test]
    fn match_is_removed_at_next_flip_and_waiters_fail() {
        let mut state = state();
        let (alice, bob) = (pid("alice"), pid("bob"));

        acquire(&mut state, &alice, 0, 0);
        acquire(&mut state, &alice, 0, 1);
        let mut signal = match state.attempt(&bob, 0, 0) {
            FlipAttempt::Wait(rx) => rx,
            other => panic!("expected wait, got {other:?}"),
        };

        acquire(&mut state, &alice, 1, 0);
        signal.try_recv().expect("removal wakes the waiter bare");
        assert_eq!(state.render(&bob), "2x2\nnone\nnone\nup B\ndown\n");

        // bob's retry finds the card gone
        match state.attempt(&bob, 0, 0) {
            FlipAttempt::Failed(FlipError::NoCardHere { row: 0, col: 0 }) => {}
            other => panic!("expected NoCardHere, got {other:?}"),
        }
    }

    #[test]
    fn deferred_wake_never_steals_from_a_new_controller() {
        let mut state = state();
        let (alice, bob, carol) = (pid("alice"), pid("bob"), pid("carol"));

        acquire(&mut state, &alice, 0, 0);
        let mut signal = match state.attempt(&bob, 0, 0) {
            FlipAttempt::Wait(rx) => rx,
            other => panic!("expected wait, got {other:?}"),
        };

        // alice fails her second flip on her own card: (0,0) is released,
        // with bob's wake deferred to her next flip
        state.finalize_previous(&alice);
        match state.attempt(&alice, 0, 0) {
            FlipAttempt::Failed(FlipError::TargetControlled { .. }) => {}
            other => panic!("expected TargetControlled, got {other:?}"),
        }

        // carol takes the released card before the deferred wake runs
        acquire(&mut state, &carol, 0, 0);
        assert_eq!(state.render(&carol), "2x2\nmy A\ndown\ndown\ndown\n");

        // alice's next flip finalizes, but carol's card is not handed over;
        // bob stays queued until carol releases it
        acquire(&mut state, &alice, 1, 0);
        assert!(signal.try_recv().is_err());
        assert_eq!(state.render(&carol), "2x2\nmy A\ndown\nup B\ndown\n");

        // carol mismatches: the card really is released now and bob gets it
        state.finalize_previous(&carol);
        match state.attempt(&carol, 1, 1) {
            FlipAttempt::Acquired => {}
            other => panic!("expected acquisition, got {other:?}"),
        }
        state.check_invariants();
        signal.try_recv().expect("the release reaches the queued waiter");
        assert_eq!(state.render(&bob), "2x2\nmy A\ndown\nup B\nup B\n");
    }

    #[test]
    fn rewrites_skip_emptied_cells() {
        let mut state = state();
        let alice = pid("alice");

        acquire(&mut state, &alice, 0, 0);
        acquire(&mut state, &alice, 0, 1);

        let labels = state.present_labels();
        assert_eq!(labels.len(), 4);

        // the pair is removed between compute and apply
        acquire(&mut state, &alice, 1, 0);

        let rewrites = labels
            .into_iter()
            .map(|(coord, label)| (coord, label.to_lowercase()))
            .collect();
        state.apply_rewrites(rewrites);
        state.check_invariants();
        assert_eq!(state.render(&alice), "2x2\nnone\nnone\nmy b\ndown\n");
    }
}
