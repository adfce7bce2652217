use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::timestamp::EpochMillis;

/// The kind of interaction a [`ContactSignal`] was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ContactPoint {
    CrcTrust,
    CrcHubTransfer,
    Erc20Transfer,
    ChatMessage,
    InvitationSent,
    InvitationRedeemed,
    MembershipOffer,
    /// Placeholder for a profile that matched a search but has no history.
    Search,
}

impl ContactPoint {
    /// Every kind backed by a data source, in merge order.
    pub const SOURCES: [ContactPoint; 7] = [
        ContactPoint::CrcTrust,
        ContactPoint::CrcHubTransfer,
        ContactPoint::Erc20Transfer,
        ContactPoint::ChatMessage,
        ContactPoint::InvitationSent,
        ContactPoint::InvitationRedeemed,
        ContactPoint::MembershipOffer,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ContactPoint::CrcTrust => "CrcTrust",
            ContactPoint::CrcHubTransfer => "CrcHubTransfer",
            ContactPoint::Erc20Transfer => "Erc20Transfer",
            ContactPoint::ChatMessage => "ChatMessage",
            ContactPoint::InvitationSent => "InvitationSent",
            ContactPoint::InvitationRedeemed => "InvitationRedeemed",
            ContactPoint::MembershipOffer => "MembershipOffer",
            ContactPoint::Search => "Search",
        }
    }

    pub fn is_source(self) -> bool {
        !matches!(self, ContactPoint::Search)
    }
}

impl fmt::Display for ContactPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownContactPoint(pub String);

impl fmt::Display for UnknownContactPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown contact point `{}`", self.0)
    }
}

impl std::error::Error for UnknownContactPoint {}

impl FromStr for ContactPoint {
    type Err = UnknownContactPoint;

    /// Accepts the PascalCase name or its snake_case spelling, ignoring case.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized: String = value
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "crctrust" => Ok(ContactPoint::CrcTrust),
            "crchubtransfer" => Ok(ContactPoint::CrcHubTransfer),
            "erc20transfer" => Ok(ContactPoint::Erc20Transfer),
            "chatmessage" => Ok(ContactPoint::ChatMessage),
            "invitationsent" => Ok(ContactPoint::InvitationSent),
            "invitationredeemed" => Ok(ContactPoint::InvitationRedeemed),
            "membershipoffer" => Ok(ContactPoint::MembershipOffer),
            "search" => Ok(ContactPoint::Search),
            _ => Err(UnknownContactPoint(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The counterparty initiated the interaction, or holds the relation toward the subject.
    In,
    /// The subject initiated the interaction toward the counterparty.
    Out,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::In => "In",
            Direction::Out => "Out",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "In" | "in" => Some(Direction::In),
            "Out" | "out" => Some(Direction::Out),
            _ => None,
        }
    }
}

/// Everything one source observed between the subject and one counterparty.
///
/// `directions`, `values` and `timestamps` are aligned by position and ordered
/// by timestamp ascending. The search placeholder carries a timestamp only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSignal {
    name: ContactPoint,
    counterparty: String,
    directions: Vec<Direction>,
    values: Vec<String>,
    timestamps: Vec<EpochMillis>,
}

impl ContactSignal {
    pub fn new(name: ContactPoint, counterparty: impl AsRef<str>) -> Self {
        Self {
            name,
            counterparty: normalize_address(counterparty.as_ref()),
            directions: Vec::new(),
            values: Vec::new(),
            timestamps: Vec::new(),
        }
    }

    pub fn with_event(
        mut self,
        direction: Direction,
        value: impl Into<String>,
        timestamp: EpochMillis,
    ) -> Self {
        self.directions.push(direction);
        self.values.push(value.into());
        self.timestamps.push(timestamp);
        self
    }

    pub fn search_marker(counterparty: impl AsRef<str>, at: EpochMillis) -> Self {
        let mut signal = Self::new(ContactPoint::Search, counterparty);
        signal.timestamps.push(at);
        signal
    }

    pub fn name(&self) -> ContactPoint {
        self.name
    }

    pub fn counterparty(&self) -> &str {
        &self.counterparty
    }

    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn timestamps(&self) -> &[EpochMillis] {
        &self.timestamps
    }

    pub fn latest_timestamp(&self) -> Option<EpochMillis> {
        self.timestamps.iter().copied().max()
    }
}

/// Restricts an aggregation to a set of counterparties. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactFilter {
    addresses: BTreeSet<String>,
}

impl ContactFilter {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            addresses: addresses
                .into_iter()
                .map(|address| normalize_address(address.as_ref()))
                .filter(|address| !address.is_empty())
                .collect(),
        }
    }

    pub fn is_restricted(&self) -> bool {
        !self.addresses.is_empty()
    }

    pub fn allows(&self, address: &str) -> bool {
        self.addresses.is_empty() || self.addresses.contains(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.addresses.iter().map(String::as_str)
    }

    /// The allow-list as a query parameter; `None` binds as SQL NULL.
    pub fn to_bind(&self) -> Option<Vec<String>> {
        if self.addresses.is_empty() {
            None
        } else {
            Some(self.addresses.iter().cloned().collect())
        }
    }
}

/// The set of sources a caller asked for. Unknown names are dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactSelection {
    points: BTreeSet<ContactPoint>,
}

impl ContactSelection {
    pub fn all() -> Self {
        Self {
            points: ContactPoint::SOURCES.into_iter().collect(),
        }
    }

    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut points = BTreeSet::new();
        for name in names {
            match name.as_ref().parse::<ContactPoint>() {
                Ok(point) if point.is_source() => {
                    points.insert(point);
                }
                Ok(_) | Err(_) => {
                    tracing::debug!(name = %name.as_ref(), "ignoring unselectable contact point");
                }
            }
        }
        Self { points }
    }

    pub fn contains(&self, point: ContactPoint) -> bool {
        self.points.contains(&point)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = ContactPoint> + '_ {
        self.points.iter().copied()
    }
}

pub fn normalize_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}
