use core::fmt;

/// Unit type of control-loop units (e.g. `C-1/TIR`).
pub const CONTROL_KIND: &str = "C";

/// Suffix after the first `/` of a unit id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UnitSuffix {
    /// `/k`: the k-th stream of a heat-integrated unit (a shadow node).
    Stream(u32),
    /// `/CODE`: uppercase control-loop type, e.g. `TIR`.
    Control(String),
    /// Anything else; kept verbatim.
    Other(String),
}

/// Identifier of a unit instance: `type-N`, optionally suffixed `/k` or `/CODE`.
///
/// The original text is kept so that ids round-trip byte for byte; the parsed
/// parts are derived from it once at construction.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId {
    text: String,
    kind_end: usize,
    instance: Option<u32>,
    suffix: Option<UnitSuffix>,
}

impl UnitId {
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let (base, suffix) = match text.split_once('/') {
            Some((base, rest)) => (base, Some(parse_suffix(rest))),
            None => (text.as_str(), None),
        };
        let (kind_end, instance) = match base.rsplit_once('-') {
            Some((kind, number)) if !kind.is_empty() => match number.parse::<u32>() {
                Ok(n) if number.bytes().all(|b| b.is_ascii_digit()) => (kind.len(), Some(n)),
                _ => (base.len(), None),
            },
            _ => (base.len(), None),
        };
        Self {
            kind_end,
            instance,
            suffix,
            text,
        }
    }

    /// Build `kind-instance` with an optional suffix.
    pub fn compose(kind: &str, instance: u32, suffix: Option<&UnitSuffix>) -> Self {
        let mut text = format!("{kind}-{instance}");
        if let Some(suffix) = suffix {
            text.push('/');
            text.push_str(&suffix.to_string());
        }
        Self::new(text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Unit type without instance number or suffix (`hex` for `hex-1/2`).
    pub fn kind(&self) -> &str {
        &self.text[..self.kind_end]
    }

    pub fn instance(&self) -> Option<u32> {
        self.instance
    }

    pub fn suffix(&self) -> Option<&UnitSuffix> {
        self.suffix.as_ref()
    }

    /// Stream slot of a heat-integration shadow node.
    pub fn stream_slot(&self) -> Option<u32> {
        match self.suffix {
            Some(UnitSuffix::Stream(k)) => Some(k),
            _ => None,
        }
    }

    pub fn control_code(&self) -> Option<&str> {
        match &self.suffix {
            Some(UnitSuffix::Control(code)) => Some(code),
            _ => None,
        }
    }

    /// Id without the `/...` suffix (`hex-1` for `hex-1/2`).
    pub fn base(&self) -> &str {
        match self.text.split_once('/') {
            Some((base, _)) => base,
            None => &self.text,
        }
    }

    pub fn is_control(&self) -> bool {
        self.kind() == CONTROL_KIND
    }

    /// Generalized form used in type-level notation: the bare unit type.
    pub fn generalized(&self) -> &str {
        self.kind()
    }
}

fn parse_suffix(rest: &str) -> UnitSuffix {
    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(k) = rest.parse() {
            return UnitSuffix::Stream(k);
        }
    }
    if !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_uppercase()) {
        return UnitSuffix::Control(rest.to_string());
    }
    UnitSuffix::Other(rest.to_string())
}

impl fmt::Display for UnitSuffix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSuffix::Stream(k) => write!(f, "{k}"),
            UnitSuffix::Control(code) | UnitSuffix::Other(code) => f.write_str(code),
        }
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.text)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for UnitId {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for UnitId {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UnitId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for UnitId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::new(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn plain_instance() {
        let id = UnitId::new("pump-3");
        assert_eq!(id.kind(), "pump");
        assert_eq!(id.instance(), Some(3));
        assert_eq!(id.suffix(), None);
        assert_eq!(id.base(), "pump-3");
    }

    #[test]
    fn shadow_and_control_suffixes() {
        let hex = UnitId::new("hex-1/2");
        assert_eq!(hex.kind(), "hex");
        assert_eq!(hex.stream_slot(), Some(2));
        assert_eq!(hex.base(), "hex-1");

        let ctrl = UnitId::new("C-4/TIR");
        assert!(ctrl.is_control());
        assert_eq!(ctrl.control_code(), Some("TIR"));
        assert_eq!(ctrl.instance(), Some(4));
    }

    #[test]
    fn generalized_id_has_no_instance() {
        let id = UnitId::new("hex");
        assert_eq!(id.kind(), "hex");
        assert_eq!(id.instance(), None);
        assert_eq!(id.generalized(), "hex");
    }

    #[test]
    fn text_round_trips_verbatim() {
        for text in ["raw-01", "a-b-2", "splt", "C-1/FC", "x-1/y"] {
            assert_eq!(UnitId::new(text).to_string(), text);
        }
        assert_eq!(UnitId::new("a-b-2").kind(), "a-b");
        assert_eq!(UnitId::new("x-1/y").suffix(), Some(&UnitSuffix::Other("y".into())));
    }

    #[test]
    fn compose_builds_suffixed_ids() {
        let id = UnitId::compose("hex", 2, Some(&UnitSuffix::Stream(1)));
        assert_eq!(id.as_str(), "hex-2/1");
        assert_eq!(id.stream_slot(), Some(1));
    }

    proptest! {
        #[test]
        fn composed_ids_parse_back(kind in "[a-z]{1,6}(-[a-z]{1,4})?", n in 1u32..10_000, k in proptest::option::of(1u32..9)) {
            let suffix = k.map(UnitSuffix::Stream);
            let id = UnitId::compose(&kind, n, suffix.as_ref());
            prop_assert_eq!(id.kind(), kind.as_str());
            prop_assert_eq!(id.instance(), Some(n));
            prop_assert_eq!(id.stream_slot(), k);
            prop_assert_eq!(UnitId::new(id.to_string()), id);
        }
    }
}
