pub mod slots;
pub mod types;

pub use slots::{derive_slots, slot_key, unknown_slot_keys, Slot};
pub use types::{
    Availability, AvailabilityMap, Meeting, NewMeeting, Participant, ParticipantAck, TimeOfDay,
};
