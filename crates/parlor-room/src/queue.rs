//! The match queue: at most one connection waiting for an opponent.

use parlor_protocol::ConnectionId;

/// Two connections matched by the queue, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pairing {
    /// The connection that was waiting.
    pub first: ConnectionId,
    /// The connection whose arrival completed the pair.
    pub second: ConnectionId,
}

/// Holds the one connection waiting to be paired.
///
/// Pairing is strictly first-come first-served: each arrival either waits
/// or is matched with whoever is already waiting.
#[derive(Debug, Default)]
pub struct MatchQueue {
    waiting: Option<ConnectionId>,
}

impl MatchQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `connection`, or pairs it with the waiting connection.
    ///
    /// Returns `None` when `connection` is now the one waiting. A repeated
    /// request from the connection already waiting changes nothing; a
    /// connection is never paired with itself.
    pub fn enqueue_or_pair(&mut self, connection: ConnectionId) -> Option<Pairing> {
        match self.waiting {
            Some(waiting) if waiting == connection => {
                tracing::debug!(%connection, "already waiting in queue");
                None
            }
            Some(waiting) => {
                self.waiting = None;
                tracing::debug!(first = %waiting, second = %connection, "paired");
                Some(Pairing {
                    first: waiting,
                    second: connection,
                })
            }
            None => {
                self.waiting = Some(connection);
                tracing::debug!(%connection, "waiting for opponent");
                None
            }
        }
    }

    /// Clears the queue if `connection` is the one waiting.
    ///
    /// Returns whether anything was removed.
    pub fn remove_if_waiting(&mut self, connection: ConnectionId) -> bool {
        if self.waiting == Some(connection) {
            self.waiting = None;
            tracing::debug!(%connection, "left queue");
            true
        } else {
            false
        }
    }

    /// The connection currently waiting, if any.
    pub fn waiting(&self) -> Option<ConnectionId> {
        self.waiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cid(id: u64) -> ConnectionId {
        ConnectionId::new(id)
    }

    #[test]
    fn test_enqueue_or_pair_first_arrival_waits() {
        let mut queue = MatchQueue::new();

        assert_eq!(queue.enqueue_or_pair(cid(1)), None);
        assert_eq!(queue.waiting(), Some(cid(1)));
    }

    #[test]
    fn test_enqueue_or_pair_second_arrival_pairs_and_clears() {
        let mut queue = MatchQueue::new();
        queue.enqueue_or_pair(cid(1));

        let pairing = queue.enqueue_or_pair(cid(2));

        assert_eq!(
            pairing,
            Some(Pairing {
                first: cid(1),
                second: cid(2)
            })
        );
        assert_eq!(queue.waiting(), None);
    }

    #[test]
    fn test_enqueue_or_pair_same_connection_twice_never_self_pairs() {
        let mut queue = MatchQueue::new();
        queue.enqueue_or_pair(cid(1));

        assert_eq!(queue.enqueue_or_pair(cid(1)), None);
        assert_eq!(queue.waiting(), Some(cid(1)));
    }

    #[test]
    fn test_enqueue_or_pair_pairs_in_arrival_order() {
        let mut queue = MatchQueue::new();

        let pairings: Vec<Pairing> = (1..=7).filter_map(|id| queue.enqueue_or_pair(cid(id))).collect();

        assert_eq!(
            pairings,
            vec![
                Pairing { first: cid(1), second: cid(2) },
                Pairing { first: cid(3), second: cid(4) },
                Pairing { first: cid(5), second: cid(6) },
            ]
        );
        assert_eq!(queue.waiting(), Some(cid(7)), "odd one out stays queued");
    }

    #[test]
    fn test_remove_if_waiting_only_removes_waiting_connection() {
        let mut queue = MatchQueue::new();
        queue.enqueue_or_pair(cid(1));

        assert!(!queue.remove_if_waiting(cid(2)));
        assert_eq!(queue.waiting(), Some(cid(1)));

        assert!(queue.remove_if_waiting(cid(1)));
        assert_eq!(queue.waiting(), None);
    }
}
