use std::collections::VecDeque;
use std::ops::Range;

use itertools::Itertools;

use crate::{Event, ModelId, RealTime, Time};

/// Ordered collection of pending events.
///
/// Events are kept sorted by [`Time`]: non-decreasing real time, and strictly increasing
/// tie-break counters among events sharing a real instant. At most one event is pending per
/// model and instant; a second arrival for the same model at the same instant is merged into
/// the pending event instead of being queued next to it:
///
/// | pending    | scheduled internal | scheduled external         |
/// |------------|--------------------|----------------------------|
/// | internal   | kept as is         | becomes confluent          |
/// | external   | becomes confluent  | payload appended to bag    |
/// | confluent  | kept as is         | payload appended to bag    |
///
/// A merged event keeps its position and counter. A new event goes after all events at its
/// instant, with the counter one greater than the last of them, or 0 if it is the first.
#[derive(Debug, Clone)]
pub struct EventQueue<P> {
    events: VecDeque<Event<P>>,
}

impl<P> Default for EventQueue<P> {
    fn default() -> Self {
        Self {
            events: VecDeque::new(),
        }
    }
}

impl<P> EventQueue<P> {
    /// Constructs an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedules an internal event for `model` at instant `r`.
    pub fn schedule_internal(&mut self, r: RealTime, model: ModelId) {
        let instant = self.instant(r);
        match self.find(instant.clone(), model) {
            Some(pos) => {
                let slot = &mut self.events[pos];
                if let Event::External { time, inputs, .. } = slot {
                    let time = *time;
                    let inputs = std::mem::take(inputs);
                    log::trace!("[{}] Internal event of model {} merged into confluent", time, model);
                    *slot = Event::Confluent {
                        model,
                        time,
                        inputs,
                    };
                } else {
                    log::trace!("[{}] Model {} already has an internal event", r, model);
                }
            }
            None => self.insert(instant, r, |time| Event::Internal { model, time }),
        }
        debug_assert!(self.is_consistent(), "event queue ordering violated");
    }

    /// Schedules an external event delivering `input` to `model` at instant `r`.
    pub fn schedule_external(&mut self, input: P, r: RealTime, model: ModelId) {
        let instant = self.instant(r);
        match self.find(instant.clone(), model) {
            Some(pos) => {
                let slot = &mut self.events[pos];
                match slot {
                    Event::Internal { time, .. } => {
                        let time = *time;
                        log::trace!("[{}] External event of model {} merged into confluent", time, model);
                        *slot = Event::Confluent {
                            model,
                            time,
                            inputs: vec![input],
                        };
                    }
                    Event::External { time, inputs, .. } | Event::Confluent { time, inputs, .. } => {
                        log::trace!("[{}] Input to model {} added to pending bag", time, model);
                        inputs.push(input);
                    }
                }
            }
            None => self.insert(instant, r, |time| Event::External {
                model,
                time,
                inputs: vec![input],
            }),
        }
        debug_assert!(self.is_consistent(), "event queue ordering violated");
    }

    /// Removes and returns, in queue order, all events at the smallest pending real instant.
    /// Returns an empty vector if the queue is empty.
    pub fn next_events(&mut self) -> Vec<Event<P>> {
        match self.time_advance() {
            Some(r) => {
                let instant = self.instant(r);
                self.events.drain(instant).collect()
            }
            None => Vec::new(),
        }
    }

    /// The smallest pending real instant, or `None` if the queue is empty.
    #[must_use]
    pub fn time_advance(&self) -> Option<RealTime> {
        self.events.front().map(|event| event.time().real())
    }

    /// Returns `true` if no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Iterates over pending events in queue order.
    pub fn iter(&self) -> impl Iterator<Item = &Event<P>> {
        self.events.iter()
    }

    /// Range of positions of events at real instant `r`. Empty ranges point to where
    /// an event at `r` would be inserted.
    fn instant(&self, r: RealTime) -> Range<usize> {
        let start = self.events.partition_point(|event| event.time().real() < r);
        let end = start
            + self
                .events
                .range(start..)
                .take_while(|event| event.time().real() == r)
                .count();
        start..end
    }

    fn find(&self, instant: Range<usize>, model: ModelId) -> Option<usize> {
        instant.into_iter().find(|&pos| self.events[pos].model() == model)
    }

    fn insert<F>(&mut self, instant: Range<usize>, r: RealTime, make_event: F)
    where
        F: FnOnce(Time) -> Event<P>,
    {
        let counter = if instant.is_empty() {
            0
        } else {
            self.events[instant.end - 1].time().counter() + 1
        };
        let event = make_event(Time::new(r, counter));
        log::trace!("Scheduled {} event of model {} at {}", event.kind(), event.model(), event.time());
        self.events.insert(instant.end, event);
    }

    /// Checks that events are strictly increasing in time and that no model has two events
    /// at the same instant.
    pub(crate) fn is_consistent(&self) -> bool {
        let sorted = self
            .events
            .iter()
            .tuple_windows()
            .all(|(lhs, rhs)| lhs.time() < rhs.time());
        let unique = self
            .events
            .iter()
            .group_by(|event| event.time().real())
            .into_iter()
            .all(|(_, events)| events.map(Event::model).all_unique());
        sorted && unique
    }
}
