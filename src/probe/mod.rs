pub mod resolver;
pub mod throttle;

pub use resolver::{DnsRecord, DnsResolver, HickoryResolver, RecordKind};
pub use throttle::{Throttle, ThrottlePermit, DNS_SERVICE};
