mod clock;
mod record;
mod storage;
mod store;

pub use {
    clock::{Clock, ManualClock, SystemClock},
    record::{SESSION_TTL_MS, SessionRecord},
    storage::{FileStorage, KeyValueStorage, MemoryStorage},
    store::{SESSION_KEY, SessionStore},
};
