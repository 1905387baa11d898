use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::error::ConnectorError;

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: RpcParams<'a>,
    pub id: u64,
}

#[derive(Debug, Serialize)]
pub struct RpcParams<'a> {
    pub service: &'a str,
    pub method: &'a str,
    pub args: Vec<JsonValue>,
}

impl<'a> RpcRequest<'a> {
    pub fn call(id: u64, service: &'a str, method: &'a str, args: Vec<JsonValue>) -> Self {
        RpcRequest {
            jsonrpc: "2.0",
            method: "call",
            params: RpcParams {
                service,
                method,
                args,
            },
            id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<JsonValue>,
    #[serde(default)]
    pub error: Option<RpcFault>,
}

#[derive(Debug, Deserialize)]
pub struct RpcFault {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<RpcFaultData>,
}

#[derive(Debug, Deserialize)]
pub struct RpcFaultData {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub message: String,
}

impl RpcFault {
    /// Access faults mean the session or credentials are no good.
    pub fn is_access_denied(&self) -> bool {
        self.data.as_ref().is_some_and(|d| {
            d.name.ends_with("AccessDenied") || d.name.ends_with("AccessError")
        }) || self.code == 100
    }

    pub fn into_error(self) -> ConnectorError {
        let (name, detail) = match self.data {
            Some(data) => (data.name, data.message),
            None => (String::new(), String::new()),
        };
        let message = if detail.is_empty() {
            self.message
        } else {
            detail
        };

        ConnectorError::Rpc {
            code: self.code,
            name,
            message,
        }
    }
}

impl RpcResponse {
    pub fn into_result(self) -> Result<JsonValue, ConnectorError> {
        if let Some(fault) = self.error {
            if fault.is_access_denied() {
                let message = fault
                    .data
                    .as_ref()
                    .map(|d| d.message.clone())
                    .filter(|m| !m.is_empty())
                    .unwrap_or(fault.message);
                return Err(ConnectorError::Auth(message));
            }
            return Err(fault.into_error());
        }

        self.result
            .ok_or_else(|| ConnectorError::Decode("response has neither result nor error".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let req = RpcRequest::call(3, "common", "version", vec![]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {"service": "common", "method": "version", "args": []},
                "id": 3
            })
        );
    }

    #[test]
    fn test_access_denied_maps_to_auth() {
        let resp: RpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.AccessDenied", "message": "Access Denied"}
            }
        }))
        .unwrap();
        let err = resp.into_result().unwrap_err();
        assert!(err.is_auth());
    }

    #[test]
    fn test_server_fault_keeps_detail() {
        let resp: RpcResponse = serde_json::from_value(json!({
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "builtins.ValueError", "message": "Invalid field 'foo'"}
            }
        }))
        .unwrap();
        match resp.into_result().unwrap_err() {
            ConnectorError::Rpc { name, message, .. } => {
                assert_eq!(name, "builtins.ValueError");
                assert_eq!(message, "Invalid field 'foo'");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
