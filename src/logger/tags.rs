/// Log tags identify the subsystem a message comes from
///
/// `to_debug_key` is the name accepted by `--debug <tag>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogTag {
    System,
    Config,
    Rpc,
    Price,
    Poller,
    Subscription,
    Aggregator,
    Query,
    Dashboard,
}

impl LogTag {
    pub fn to_debug_key(&self) -> String {
        match self {
            LogTag::System => "system".to_string(),
            LogTag::Config => "config".to_string(),
            LogTag::Rpc => "rpc".to_string(),
            LogTag::Price => "price".to_string(),
            LogTag::Poller => "poller".to_string(),
            LogTag::Subscription => "subscription".to_string(),
            LogTag::Aggregator => "aggregator".to_string(),
            LogTag::Query => "query".to_string(),
            LogTag::Dashboard => "dashboard".to_string(),
        }
    }

    /// Uncolored label used for the console column
    pub fn to_plain_string(&self) -> String {
        match self {
            LogTag::System => "SYSTEM".to_string(),
            LogTag::Config => "CONFIG".to_string(),
            LogTag::Rpc => "RPC".to_string(),
            LogTag::Price => "PRICE".to_string(),
            LogTag::Poller => "POLLER".to_string(),
            LogTag::Subscription => "SLOTSUB".to_string(),
            LogTag::Aggregator => "AGGREGATE".to_string(),
            LogTag::Query => "QUERY".to_string(),
            LogTag::Dashboard => "DASHBOARD".to_string(),
        }
    }
}
