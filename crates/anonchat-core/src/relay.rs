//! Relay
//!
//! Forwards a participant's message to their current partner. The relay only
//! reads the pairing map and never looks inside the payload.

use tracing::{debug, warn};

use crate::channel::Effect;
use crate::pairing::{PairingEngine, Reaction};
use crate::types::{ParticipantId, Payload};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Sender has no active partner
    NotPaired,
    /// Pairing map points the sender at itself
    SelfPaired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Forwarded { to: ParticipantId },
    Dropped { reason: DropReason },
}

impl Delivery {
    pub fn is_delivered(&self) -> bool {
        matches!(self, Delivery::Forwarded { .. })
    }
}

pub struct Relay;

impl Relay {
    /// Route `payload` from `sender` to its partner.
    ///
    /// Messages from unpaired senders are dropped, not queued.
    pub fn forward(engine: &PairingEngine, sender: ParticipantId, payload: Payload) -> Reaction<Delivery> {
        let Some(partner) = engine.partner_of(sender) else {
            debug!("Dropping {:?} from {}: not paired", payload, sender);
            return Reaction::new(Delivery::Dropped {
                reason: DropReason::NotPaired,
            });
        };

        if partner == sender {
            warn!("Pairing map points {} at itself; dropping message", sender);
            return Reaction::new(Delivery::Dropped {
                reason: DropReason::SelfPaired,
            });
        }

        let mut reaction = Reaction::new(Delivery::Forwarded { to: partner });
        reaction.effects.push(Effect::DeliverPayload {
            participant: partner,
            payload,
        });
        reaction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_to_partner_untouched() {
        let mut engine = PairingEngine::default();
        let (a, b) = (ParticipantId::new(1), ParticipantId::new(2));
        engine.request_connect(a);
        engine.request_connect(b);

        let payload = Payload::from(vec![0, 159, 146, 150]);
        let reaction = Relay::forward(&engine, a, payload.clone());
        assert_eq!(reaction.outcome, Delivery::Forwarded { to: b });
        assert_eq!(
            reaction.effects,
            vec![Effect::DeliverPayload {
                participant: b,
                payload,
            }]
        );
    }

    #[test]
    fn unpaired_sender_is_dropped_silently() {
        let mut engine = PairingEngine::default();
        let waiting = ParticipantId::new(1);
        engine.request_connect(waiting);

        for sender in [waiting, ParticipantId::new(77)] {
            let reaction = Relay::forward(&engine, sender, Payload::from("hello?"));
            assert_eq!(
                reaction.outcome,
                Delivery::Dropped {
                    reason: DropReason::NotPaired
                }
            );
            assert!(reaction.effects.is_empty());
            assert!(!reaction.outcome.is_delivered());
        }
    }
}
