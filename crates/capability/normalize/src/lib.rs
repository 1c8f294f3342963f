//! JSON 统计报文 → 归一化统计写入。
//!
//! 报文形如：
//!
//! ```json
//! {
//!   "sensor_name": "Bedroom Sensor",
//!   "Temperature": {"timestamp": 1234567890, "unit": "C", "min": 12.9, "max": 44.1, "avg": 22.9},
//!   "Humidity":    {"timestamp": 1234567890, "unit": "%", "min": 45.0, "max": 75.0, "avg": 60.5}
//! }
//! ```
//!
//! 每个频道的 min/max/avg 各展开成一条 `{prefix}.{uid}.{频道}.{stat}`
//! 写入；带 `sensor_name` 时同一组值再按友好名写一份。另接受三种
//! 简化负载：单值频道对象、`key=value` 文本、裸数值。

use domain::StatWrite;
use serde_json::Value;

/// 规范化错误。
#[derive(Debug, thiserror::Error)]
pub enum NormalizeError {
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

const STAT_KEYS: [&str; 3] = ["min", "max", "avg"];

/// 解析一条统计报文，产出写入列表。
///
/// `now` 是消息接收时间，报文没带 `timestamp` 时作为兜底时间戳。
pub fn parse_stat_report(
    prefix: &str,
    uid: &str,
    payload: &[u8],
    now: i64,
) -> Result<Vec<StatWrite>, NormalizeError> {
    let text = std::str::from_utf8(payload)
        .map_err(|err| NormalizeError::InvalidPayload(err.to_string()))?;
    let base_path = join_path(prefix, uid);

    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        match value {
            Value::Object(object) => return Ok(parse_report_object(prefix, &base_path, object, now)),
            Value::Number(number) => {
                if let Some(value) = number.as_f64() {
                    return Ok(vec![StatWrite {
                        metric_path: base_path,
                        value,
                        ts: now,
                    }]);
                }
            }
            _ => {}
        }
        return Err(NormalizeError::InvalidPayload("unsupported json shape".to_string()));
    }

    // `key=value` 文本
    if let Some((key, value)) = text.split_once('=') {
        if let Ok(value) = value.trim().parse::<f64>() {
            return Ok(vec![StatWrite {
                metric_path: format!("{}.{}", base_path, key.trim()),
                value,
                ts: now,
            }]);
        }
    }

    // 裸数值
    if let Ok(value) = text.trim().parse::<f64>() {
        return Ok(vec![StatWrite {
            metric_path: base_path,
            value,
            ts: now,
        }]);
    }

    Err(NormalizeError::InvalidPayload("unrecognized payload".to_string()))
}

fn parse_report_object(
    prefix: &str,
    base_path: &str,
    object: serde_json::Map<String, Value>,
    now: i64,
) -> Vec<StatWrite> {
    // 友好名：小写、空格换下划线，作为第二份指标路径
    let friendly_base = object
        .get("sensor_name")
        .and_then(Value::as_str)
        .map(|name| join_path(prefix, &name.replace(' ', "_").to_lowercase()));

    let mut writes = Vec::new();
    for (channel, entry) in &object {
        if channel == "sensor_name" {
            continue;
        }
        match entry {
            Value::Object(stats) if STAT_KEYS.iter().any(|key| stats.contains_key(*key)) => {
                let ts = stats.get("timestamp").and_then(Value::as_i64).unwrap_or(now);
                let channel_key = channel.replace(' ', "_");
                for stat in STAT_KEYS {
                    let Some(value) = stats.get(stat).and_then(numeric) else {
                        continue;
                    };
                    writes.push(StatWrite {
                        metric_path: format!("{}.{}.{}", base_path, channel_key, stat),
                        value,
                        ts,
                    });
                    if let Some(friendly_base) = &friendly_base {
                        writes.push(StatWrite {
                            metric_path: format!("{}.{}.{}", friendly_base, channel_key, stat),
                            value,
                            ts,
                        });
                    }
                }
            }
            Value::Number(number) => {
                if let Some(value) = number.as_f64() {
                    writes.push(StatWrite {
                        metric_path: format!("{}.{}", base_path, channel.replace(' ', "_")),
                        value,
                        ts: now,
                    });
                }
            }
            _ => {}
        }
    }
    writes
}

/// 数值字段：数字或可解析为数字的字符串。
fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn join_path(prefix: &str, tail: &str) -> String {
    if prefix.is_empty() {
        tail.to_string()
    } else {
        format!("{}.{}", prefix, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "monitoring_data";

    #[test]
    fn stat_report_fans_out_per_stat() {
        let payload = br#"{
            "Temperature": {"timestamp": 1234567890, "unit": "C", "min": 18.5, "max": 24.3, "avg": 21.4},
            "Humidity": {"timestamp": 1234567890, "unit": "%", "min": 52.0, "max": 68.5, "avg": 60.2}
        }"#;
        let writes = parse_stat_report(PREFIX, "ESP32_TEST01", payload, 42).expect("parse");
        assert_eq!(writes.len(), 6);
        let min = writes
            .iter()
            .find(|write| write.metric_path == "monitoring_data.ESP32_TEST01.Temperature.min")
            .expect("temperature min");
        assert_eq!(min.value, 18.5);
        assert_eq!(min.ts, 1234567890);
        assert!(writes
            .iter()
            .any(|write| write.metric_path == "monitoring_data.ESP32_TEST01.Humidity.avg"));
    }

    #[test]
    fn sensor_name_doubles_writes() {
        let payload = br#"{
            "sensor_name": "Bedroom Sensor",
            "Temperature": {"timestamp": 10, "min": 1.0, "max": 2.0, "avg": 1.5}
        }"#;
        let writes = parse_stat_report(PREFIX, "BEDROOM_001", payload, 42).expect("parse");
        assert_eq!(writes.len(), 6);
        assert!(writes
            .iter()
            .any(|write| write.metric_path == "monitoring_data.bedroom_sensor.Temperature.min"));
        assert!(writes
            .iter()
            .any(|write| write.metric_path == "monitoring_data.BEDROOM_001.Temperature.min"));
    }

    #[test]
    fn missing_timestamp_uses_receive_time() {
        let payload = br#"{"Temperature": {"avg": 21.4}}"#;
        let writes = parse_stat_report(PREFIX, "ESP32_TEST01", payload, 42).expect("parse");
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].ts, 42);
    }

    #[test]
    fn scalar_channel_and_fallback_payloads() {
        let writes = parse_stat_report(PREFIX, "U1", br#"{"Battery Level": 3.7}"#, 42).expect("parse");
        assert_eq!(writes[0].metric_path, "monitoring_data.U1.Battery_Level");
        assert_eq!(writes[0].value, 3.7);

        let writes = parse_stat_report(PREFIX, "U1", b"voltage=3.3", 42).expect("parse");
        assert_eq!(writes[0].metric_path, "monitoring_data.U1.voltage");
        assert_eq!(writes[0].value, 3.3);

        let writes = parse_stat_report(PREFIX, "U1", b"21.5", 42).expect("parse");
        assert_eq!(writes[0].metric_path, "monitoring_data.U1");
        assert_eq!(writes[0].value, 21.5);
    }

    #[test]
    fn garbage_payload_is_rejected() {
        assert!(parse_stat_report(PREFIX, "U1", b"hello world", 42).is_err());
        assert!(parse_stat_report(PREFIX, "U1", &[0xff, 0xfe, 0x00], 42).is_err());
    }
}
