pub use sat_anatomy_core as core;
