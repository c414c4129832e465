#![doc = r#"
Async and stream adapters over the `pulsedb-client` callback contract.

Operation mapping:

| Async operation | Client callback API |
| --- | --- |
| `read_value` | `Query::listen_once` + single-fire `ValueListener` |
| `write_value` | `Reference::set_value` + write acknowledgment |
| `write_child_value` | `Reference::set_child_value` + write acknowledgment |
| `push_value` | `Reference::push`, then `set_value` at the generated child |
| `watch` | `Query::listen` + persistent `ValueListener`, `remove_listener` on drop |

Implementation notes:
- One listener per in-flight operation; deregistration is tied to `Drop` so
  caller cancellation tears the listener down before the cancellation
  completes. Removal at the client is idempotent.
- An absent value is a decode failure, never a default, for one-shot reads
  and subscriptions alike; an undecodable subscription payload closes the
  stream with `BridgeError::Decode` instead of faulting.
- Subscriptions buffer through an unbounded channel; no backpressure is
  imposed on the client.
"#]

pub mod error;
pub mod once;
pub mod watch;

pub use crate::error::BridgeError;
pub use crate::once::{push_value, read_value, write_child_value, write_value};
pub use crate::watch::{ValueStream, watch};
