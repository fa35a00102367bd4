#[macro_use]
pub mod logging;

pub mod config;
pub mod error;
pub mod gateway;
pub mod meeting;
pub mod notify;
pub mod store;

pub use config::Config;
pub use error::{GatewayError, StoreError};
pub use gateway::{ApiClient, Gateway, RetryPolicy};
pub use meeting::{
    derive_slots, Availability, AvailabilityMap, Meeting, NewMeeting, Participant,
    ParticipantAck, Slot, TimeOfDay,
};
pub use notify::{LogNotifier, Notifications, Notifier};
pub use store::{MeetingStore, Operation, OperationStatus, StoreSnapshot};
