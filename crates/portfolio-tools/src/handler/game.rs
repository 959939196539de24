//! In-game nickname lookups through the Duniagames top-up inquiry endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::args::ToolArgs;
use crate::error::ToolError;
use crate::handler::ToolHandler;
use crate::schema::{FieldSchema, FieldType};

const INQUIRY_URL: &str = "https://api.duniagames.co.id/api/transaction/v1/top-up/inquiry/store";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:83.0) Gecko/20100101 Firefox/83.0";
const TIMEOUT: Duration = Duration::from_secs(15);

/// Catalogue identifiers for one game.
#[derive(Clone, Copy, Debug)]
pub struct GameMeta {
    pub slug: &'static str,
    pub name: &'static str,
    pub game: &'static str,
    pub product_id: u32,
    pub item_id: u32,
    pub catalog_id: u32,
    pub payment_id: u32,
    pub product_ref: &'static str,
    pub denom: &'static str,
    pub needs_zone: bool,
    /// Fixed server sent instead of a zone.
    pub server: Option<(&'static str, &'static str)>,
    pub user_id_example: &'static str,
}

pub const GAMES: &[GameMeta] = &[
    GameMeta {
        slug: "check-ign-ml",
        name: "Mobile Legends: Bang Bang",
        game: "MOBILE_LEGENDS",
        product_id: 1,
        item_id: 3,
        catalog_id: 58,
        payment_id: 353,
        product_ref: "CMS",
        denom: "REG",
        needs_zone: true,
        server: None,
        user_id_example: "e.g. 604210151",
    },
    GameMeta {
        slug: "check-ign-ff",
        name: "Free Fire",
        game: "FREEFIRE",
        product_id: 3,
        item_id: 353,
        catalog_id: 376,
        payment_id: 1252,
        product_ref: "CMS",
        denom: "REG",
        needs_zone: false,
        server: None,
        user_id_example: "e.g. 116502997",
    },
    GameMeta {
        slug: "check-ign-cod",
        name: "Call of Duty Mobile",
        game: "CALL_OF_DUTY",
        product_id: 18,
        item_id: 88,
        catalog_id: 144,
        payment_id: 828,
        product_ref: "CMS",
        denom: "REG",
        needs_zone: false,
        server: None,
        user_id_example: "e.g. 10808316016143544796",
    },
    GameMeta {
        slug: "check-ign-bloodstrike",
        name: "Blood Strike",
        game: "BLOOD_STRIKE",
        product_id: 149,
        item_id: 1654,
        catalog_id: 2836,
        payment_id: 7578,
        product_ref: "REG",
        denom: "REG",
        needs_zone: false,
        server: Some(("-1", "Blood Strike")),
        user_id_example: "e.g. 586027092228",
    },
];

pub(crate) fn handlers(client: reqwest::Client) -> Vec<Arc<dyn ToolHandler>> {
    GAMES
        .iter()
        .map(|meta| {
            Arc::new(CheckIgn {
                meta: *meta,
                client: client.clone(),
            }) as Arc<dyn ToolHandler>
        })
        .collect()
}

impl GameMeta {
    /// Request body for an inquiry.
    pub fn payload(&self, user_id: &str, zone_id: &str) -> Value {
        let mut body = Map::new();
        body.insert("productId".into(), json!(self.product_id));
        body.insert("itemId".into(), json!(self.item_id));
        body.insert("catalogId".into(), json!(self.catalog_id));
        body.insert("paymentId".into(), json!(self.payment_id));
        body.insert("gameId".into(), json!(user_id));
        body.insert("product_ref".into(), json!(self.product_ref));
        body.insert("product_ref_denom".into(), json!(self.denom));
        if let Some((server_id, server_name)) = self.server {
            body.insert("serverId".into(), json!(server_id));
            body.insert("serverName".into(), json!(server_name));
        } else if self.needs_zone {
            body.insert("zoneId".into(), json!(zone_id));
        }
        Value::Object(body)
    }
}

/// Extract the nickname from an inquiry response.
pub fn parse_inquiry(body: &Value) -> Result<String, ToolError> {
    if let Some(code) = body.get("statusCode").and_then(Value::as_f64) {
        if code != 200.0 {
            let msg = body.get("message").and_then(Value::as_str).unwrap_or("");
            return Err(ToolError::Upstream(format!(
                "duniagames error: {} (code: {})",
                msg, code as i64
            )));
        }
    }
    let data = body
        .get("data")
        .and_then(Value::as_object)
        .ok_or_else(|| ToolError::Upstream("unexpected response structure".into()))?;
    match data.get("userNameGame").and_then(Value::as_str) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(ToolError::Upstream("nickname not found".into())),
    }
}

pub struct CheckIgn {
    meta: GameMeta,
    client: reqwest::Client,
}

#[async_trait]
impl ToolHandler for CheckIgn {
    fn slug(&self) -> &'static str {
        self.meta.slug
    }

    fn name(&self) -> &'static str {
        self.meta.name
    }

    fn input_schema(&self) -> Vec<FieldSchema> {
        let mut fields = vec![FieldSchema::new("user_id", "User ID", FieldType::Text)
            .placeholder(self.meta.user_id_example)
            .required()];
        if self.meta.needs_zone {
            fields.push(
                FieldSchema::new("zone_id", "Zone ID", FieldType::Text)
                    .placeholder("e.g. 8425")
                    .required(),
            );
        }
        fields
    }

    async fn execute(&self, args: &ToolArgs) -> Result<Value, ToolError> {
        let user_id = args.string("user_id");
        let zone_id = args.string("zone_id");
        if user_id.is_empty() {
            return Err(ToolError::InvalidInput("user_id is required".into()));
        }
        if self.meta.needs_zone && zone_id.is_empty() {
            return Err(ToolError::InvalidInput(
                "zone_id is required for this game".into(),
            ));
        }

        let resp = self
            .client
            .post(INQUIRY_URL)
            .header(reqwest::header::USER_AGENT, USER_AGENT)
            .timeout(TIMEOUT)
            .json(&self.meta.payload(&user_id, &zone_id))
            .send()
            .await?;
        let body: Value = resp
            .json()
            .await
            .map_err(|e| ToolError::Upstream(format!("invalid duniagames response: {}", e)))?;

        let nickname = parse_inquiry(&body)?;
        tracing::debug!(game = self.meta.game, "Resolved in-game nickname");

        let mut out = json!({
            "nickname": nickname,
            "game": self.meta.game,
            "user_id": user_id,
        });
        if !zone_id.is_empty() {
            out["zone_id"] = json!(zone_id);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(slug: &str) -> GameMeta {
        *GAMES.iter().find(|g| g.slug == slug).unwrap()
    }

    #[test]
    fn test_ml_payload_includes_zone() {
        let body = meta("check-ign-ml").payload("604210151", "8425");
        assert_eq!(body["productId"], 1);
        assert_eq!(body["paymentId"], 353);
        assert_eq!(body["gameId"], "604210151");
        assert_eq!(body["zoneId"], "8425");
        assert!(body.get("serverId").is_none());
    }

    #[test]
    fn test_bloodstrike_payload_uses_fixed_server() {
        let body = meta("check-ign-bloodstrike").payload("586027092228", "");
        assert_eq!(body["serverId"], "-1");
        assert_eq!(body["serverName"], "Blood Strike");
        assert_eq!(body["product_ref"], "REG");
        assert!(body.get("zoneId").is_none());
    }

    #[test]
    fn test_ff_payload_has_no_zone() {
        let body = meta("check-ign-ff").payload("116502997", "123");
        assert!(body.get("zoneId").is_none());
        assert_eq!(body["catalogId"], 376);
    }

    #[test]
    fn test_parse_inquiry() {
        let ok = json!({"statusCode": 200, "data": {"userNameGame": "Player1"}});
        assert_eq!(parse_inquiry(&ok).unwrap(), "Player1");

        let failed = json!({"statusCode": 400, "message": "Invalid ID"});
        assert_eq!(
            parse_inquiry(&failed).unwrap_err().to_string(),
            "duniagames error: Invalid ID (code: 400)"
        );

        let empty = json!({"statusCode": 200, "data": {"userNameGame": ""}});
        assert_eq!(parse_inquiry(&empty).unwrap_err().to_string(), "nickname not found");

        assert!(parse_inquiry(&json!({"statusCode": 200})).is_err());
    }

    #[tokio::test]
    async fn test_missing_ids_fail_before_request() {
        let tool = CheckIgn {
            meta: meta("check-ign-ml"),
            client: reqwest::Client::new(),
        };
        let err = tool.execute(&ToolArgs::default()).await.unwrap_err();
        assert_eq!(err.to_string(), "user_id is required");

        let args = ToolArgs::from_value(json!({"user_id": "1"}));
        let err = tool.execute(&args).await.unwrap_err();
        assert_eq!(err.to_string(), "zone_id is required for this game");
    }

    #[test]
    fn test_zone_field_only_when_needed() {
        let client = reqwest::Client::new();
        let ml = CheckIgn { meta: meta("check-ign-ml"), client: client.clone() };
        let cod = CheckIgn { meta: meta("check-ign-cod"), client };
        assert_eq!(ml.input_schema().len(), 2);
        assert_eq!(cod.input_schema().len(), 1);
    }
}
