use serde::Serialize;

use crate::config::FactoryProperties;

pub const SPEC_VERSION: &str = "3.0";
pub const SPEC_MAJOR_VERSION: u32 = 3;
pub const SPEC_MINOR_VERSION: u32 = 0;
pub const PROVIDER_NAME: &str = "Open Message Queue";
pub const PROVIDER_VERSION: &str = "6.0";
pub const PROVIDER_MAJOR_VERSION: u32 = 6;
pub const PROVIDER_MINOR_VERSION: u32 = 0;

pub const JMSX_GROUP_ID: &str = "JMSXGroupID";
pub const JMSX_GROUP_SEQ: &str = "JMSXGroupSeq";
pub const JMSX_DELIVERY_COUNT: &str = "JMSXDeliveryCount";
pub const JMSX_APP_ID: &str = "JMSXAppID";
pub const JMSX_CONSUMER_TXID: &str = "JMSXConsumerTXID";
pub const JMSX_PRODUCER_TXID: &str = "JMSXProducerTXID";
pub const JMSX_RCV_TIMESTAMP: &str = "JMSXRcvTimestamp";
pub const JMSX_USER_ID: &str = "JMSXUserID";

/// Optional extended properties, in reporting order, with the flag that enables each.
const OPTIONAL_PROPERTIES: [(&str, &str); 5] = [
    ("imqSetJMSXAppID", JMSX_APP_ID),
    ("imqSetJMSXConsumerTXID", JMSX_CONSUMER_TXID),
    ("imqSetJMSXProducerTXID", JMSX_PRODUCER_TXID),
    ("imqSetJMSXRcvTimestamp", JMSX_RCV_TIMESTAMP),
    ("imqSetJMSXUserID", JMSX_USER_ID),
];

/// Read-only description of a connection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConnectionMetaData {
    pub spec_version: &'static str,
    pub spec_major_version: u32,
    pub spec_minor_version: u32,
    pub provider_name: &'static str,
    pub provider_version: &'static str,
    pub provider_major_version: u32,
    pub provider_minor_version: u32,
    jmsx_properties: Vec<&'static str>,
}

impl ConnectionMetaData {
    pub fn from_properties(properties: &FactoryProperties) -> Self {
        let mut jmsx_properties = vec![JMSX_GROUP_ID, JMSX_GROUP_SEQ, JMSX_DELIVERY_COUNT];
        jmsx_properties.extend(
            OPTIONAL_PROPERTIES
                .iter()
                .filter(|(flag, _)| properties.flag(flag))
                .map(|&(_, name)| name),
        );
        Self {
            spec_version: SPEC_VERSION,
            spec_major_version: SPEC_MAJOR_VERSION,
            spec_minor_version: SPEC_MINOR_VERSION,
            provider_name: PROVIDER_NAME,
            provider_version: PROVIDER_VERSION,
            provider_major_version: PROVIDER_MAJOR_VERSION,
            provider_minor_version: PROVIDER_MINOR_VERSION,
            jmsx_properties,
        }
    }

    /// Supported JMSX property names in a stable order.
    pub fn jmsx_property_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.jmsx_properties.iter().copied()
    }

    pub fn supports(&self, property: &str) -> bool {
        self.jmsx_properties.iter().any(|name| *name == property)
    }
}
