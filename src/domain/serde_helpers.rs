//! Serde adapters so exported reports carry base58 addresses and base64
//! payloads instead of raw byte arrays.

/// `Pubkey` as a base58 string.
pub mod pubkey {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(key)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Pubkey::from_str(&raw).map_err(D::Error::custom)
    }
}

/// `Option<Pubkey>` as a base58 string or `null`.
pub mod option_pubkey {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use solana_sdk::pubkey::Pubkey;
    use std::str::FromStr;

    pub fn serialize<S: Serializer>(key: &Option<Pubkey>, serializer: S) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.collect_str(key),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Pubkey>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| Pubkey::from_str(&raw).map_err(D::Error::custom))
            .transpose()
    }
}

/// Raw bytes as standard base64.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        STANDARD.decode(raw).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use solana_sdk::pubkey::Pubkey;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::pubkey")]
        key: Pubkey,
        #[serde(with = "super::option_pubkey")]
        maybe: Option<Pubkey>,
        #[serde(with = "super::base64_bytes")]
        payload: Vec<u8>,
    }

    #[test]
    fn test_addresses_are_exported_as_base58() {
        let key = Pubkey::new_unique();
        let wrapper = Wrapper { key, maybe: None, payload: vec![1, 2, 3] };
        let json = serde_json::to_value(&wrapper).unwrap();

        assert_eq!(json["key"], key.to_string());
        assert!(json["maybe"].is_null());
        assert_eq!(json["payload"], "AQID");

        let back: Wrapper = serde_json::from_value(json).unwrap();
        assert_eq!(back, wrapper);
    }
}
