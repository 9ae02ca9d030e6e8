/*! Request sequences: the output of the optimizer */

use derive_more::{Display, From};

use crate::time::{Duration, Time};

/// One resource request: a reservation of `length` time units, at the
/// end of which the job writes a checkpoint if `checkpoint` is set.
#[derive(Debug, Clone, Copy, PartialEq, Display)]
#[display(fmt = "({}, {})", length, checkpoint)]
pub struct Reservation {
    pub length: Duration,
    pub checkpoint: bool,
}

impl Reservation {
    pub fn new(length: Duration, checkpoint: bool) -> Self {
        Reservation { length, checkpoint }
    }

    /// A reservation that does not end with a checkpoint.
    pub fn plain(length: Duration) -> Self {
        Reservation::new(length, false)
    }
}

/// An ordered sequence of reservations to submit until the job
/// completes.
///
/// If a reservation ends with a checkpoint, the next one resumes from
/// the saved progress; otherwise, the next one starts the job over.
#[derive(Debug, Clone, PartialEq, Default, From)]
pub struct RequestSequence {
    reservations: Vec<Reservation>,
}

impl RequestSequence {
    pub fn new(reservations: Vec<Reservation>) -> Self {
        RequestSequence { reservations }
    }

    pub fn reservations(&self) -> &[Reservation] {
        &self.reservations
    }

    pub fn len(&self) -> usize {
        self.reservations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reservations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> + '_ {
        self.reservations.iter()
    }

    /// The reservation lengths, without checkpoint information.
    pub fn lengths(&self) -> Vec<Duration> {
        self.reservations.iter().map(|r| r.length).collect()
    }

    /// The longest execution time the sequence can accommodate, taking
    /// into account progress saved by checkpoints.
    pub fn coverage(&self) -> Time {
        let mut saved = 0.0;
        let mut reach: Time = 0.0;
        for r in &self.reservations {
            reach = reach.max(saved + r.length);
            if r.checkpoint {
                saved += r.length;
            }
        }
        reach
    }
}

impl FromIterator<Reservation> for RequestSequence {
    fn from_iter<I: IntoIterator<Item = Reservation>>(iter: I) -> Self {
        RequestSequence::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a RequestSequence {
    type Item = &'a Reservation;
    type IntoIter = std::slice::Iter<'a, Reservation>;

    fn into_iter(self) -> Self::IntoIter {
        self.reservations.iter()
    }
}
