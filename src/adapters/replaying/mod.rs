//! Replaying adapters that serve recorded interactions from cassettes.

pub mod image_generator;

use std::sync::{Arc, Mutex, PoisonError};

use crate::cassette::replayer::CassetteReplayer;

/// Retrieve the next recorded output for a given port and method.
pub(crate) fn next_output(
    replayer: &Arc<Mutex<CassetteReplayer>>,
    port: &str,
    method: &str,
) -> Result<serde_json::Value, String> {
    let mut guard = replayer.lock().unwrap_or_else(PoisonError::into_inner);
    guard.next_interaction(port, method).map(|i| i.output)
}

/// Interpret a replayed output as `Result<T, String>`.
///
/// Outputs follow the `{"Ok": ..}` / `{"Err": ".."}` convention; a bare value
/// is treated as `Ok`.
pub(crate) fn replay_result<T: serde::de::DeserializeOwned>(
    output: serde_json::Value,
) -> Result<T, String> {
    if let Some(err_val) = output.get("Err").or_else(|| output.get("err")) {
        return Err(err_val.as_str().unwrap_or("replayed error").to_string());
    }
    let value = match output.get("Ok").or_else(|| output.get("ok")) {
        Some(ok_val) => ok_val.clone(),
        None => output,
    };
    serde_json::from_value(value).map_err(|e| format!("Malformed cassette output: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ok_value_deserializes() {
        let value: Vec<u8> = replay_result(json!({"Ok": [1, 2]})).unwrap();
        assert_eq!(value, vec![1, 2]);
    }

    #[test]
    fn bare_value_is_ok() {
        let value: String = replay_result(json!("plain")).unwrap();
        assert_eq!(value, "plain");
    }

    #[test]
    fn err_value_is_message() {
        let err = replay_result::<String>(json!({"Err": "boom"})).unwrap_err();
        assert_eq!(err, "boom");
    }

    #[test]
    fn mismatched_shape_is_error() {
        let err = replay_result::<Vec<u8>>(json!({"Ok": "not a list"})).unwrap_err();
        assert!(err.starts_with("Malformed cassette output"));
    }
}
