//! Adapters: concrete implementations at the edge of the door core.
//!
//! | Adapter    | Implements / drives | Connects to          |
//! |------------|---------------------|----------------------|
//! | `console`  | DoorStateMachine    | UART line console    |
//! | `log_sink` | StateListener       | Serial log output    |

pub mod console;
pub mod log_sink;
