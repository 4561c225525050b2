use chrono::{DateTime, SecondsFormat, Utc};

use crate::csv_codec::escape_field;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Delivery attempt status as persisted in the ledger.
pub enum DeliveryStatus {
    Ok,
    Fail,
}

impl DeliveryStatus {
    pub fn from_ok(ok: bool) -> Self {
        if ok {
            DeliveryStatus::Ok
        } else {
            DeliveryStatus::Fail
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeliveryStatus::Ok => "ok",
            DeliveryStatus::Fail => "fail",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One ledger entry. Field order is fixed and persisted bit-compatibly:
/// `ts, public_id, date, channel, status, provider_message`.
pub struct DeliveryRecord {
    pub timestamp: DateTime<Utc>,
    pub user_id: String,
    pub date: String,
    pub channel: String,
    pub status: DeliveryStatus,
    pub provider_message: String,
}

impl DeliveryRecord {
    pub const CSV_HEADER: &'static str = "ts,public_id,date,channel,status,provider_message";

    pub fn now(
        user_id: impl Into<String>,
        date: impl Into<String>,
        channel: impl Into<String>,
        ok: bool,
        provider_message: impl Into<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            user_id: user_id.into(),
            date: date.into(),
            channel: channel.into(),
            status: DeliveryStatus::from_ok(ok),
            provider_message: provider_message.into(),
        }
    }

    /// Renders the record as one CSV line (without trailing newline).
    pub fn to_csv_line(&self) -> String {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, false);
        [
            ts.as_str(),
            self.user_id.as_str(),
            self.date.as_str(),
            self.channel.as_str(),
            self.status.as_str(),
            self.provider_message.as_str(),
        ]
        .iter()
        .map(|field| escape_field(field))
        .collect::<Vec<_>>()
        .join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn csv_line_preserves_field_order() {
        let record = DeliveryRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 7, 0, 3).unwrap(),
            user_id: "u1".to_string(),
            date: "2024-01-01".to_string(),
            channel: "feishu".to_string(),
            status: DeliveryStatus::Ok,
            provider_message: "{\"StatusCode\":0}".to_string(),
        };

        let line = record.to_csv_line();
        assert!(line.starts_with("2024-01-01T07:00:03"));
        assert!(line.contains(",u1,2024-01-01,feishu,ok,"));
        // The provider message contains quotes, so it is quoted and doubled.
        assert!(line.ends_with("\"{\"\"StatusCode\"\":0}\""));
    }

    #[test]
    fn timestamp_is_utc_iso8601() {
        let record = DeliveryRecord::now("u", "2024-01-01", "feishu", false, "m");
        let line = record.to_csv_line();
        assert!(line.contains("+00:00"));
    }
}
