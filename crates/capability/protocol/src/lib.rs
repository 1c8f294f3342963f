//! 旧版固件的定长二进制报文解码。
//!
//! 一条消息装 1..8 条 37 字节记录，记录数打包在首字节高 3 位
//! （`N = 1 + (byte0 >> 5)`）。记录布局（小端）：
//!
//! | 偏移  | 宽度 | 字段 |
//! |-------|------|------|
//! | 0     | 1    | 头字节（高 3 位 = 记录数 - 1） |
//! | 1     | 6    | 设备标识，字节序反转存放 |
//! | 7     | 8    | 基准时间戳（i64，秒） |
//! | 15    | 8    | 温度 act/avg/max/min（4×i16，真实值 ×10） |
//! | 23    | 4    | 温度 max/min 时刻偏移（2×i16，秒） |
//! | 27    | 4    | 湿度 act/avg/max/min（4×u8，百分比） |
//! | 31    | 4    | 湿度 max/min 时刻偏移（2×i16，秒） |
//! | 35    | 2    | 保留 |
//!
//! 偏移是相对基准时间戳的有符号秒数，±32767 秒是格式固有上限。
//! 缓冲区尾部不足一条记录时静默截断；连一条都凑不够才算坏消息。

use domain::StatWrite;
use std::collections::BTreeMap;

/// 单条记录的固定长度（字节）。
pub const RECORD_LEN: usize = 37;

/// 二进制报文解码错误。
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// 缓冲区不足一条完整记录
    #[error("frame too short: {0} bytes")]
    Truncated(usize),
}

/// 一个频道的统计值与时刻。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub act: f64,
    pub avg: f64,
    pub max: f64,
    pub max_ts: i64,
    pub min: f64,
    pub min_ts: i64,
}

/// 解码后的一条传感器记录。
#[derive(Debug, Clone, PartialEq)]
pub struct SensorRecord {
    /// 设备标识，12 位大写十六进制。
    pub device_uid: String,
    /// 基准时间戳（Unix 秒），也是 avg 统计的时刻。
    pub timestamp: i64,
    pub temperature: ChannelStats,
    pub humidity: ChannelStats,
}

/// 解码一条消息里打包的全部记录。
///
/// 尾部凑不满 `RECORD_LEN` 的残缺记录直接丢弃，不算错误。
pub fn decode_frame(frame: &[u8]) -> Result<Vec<SensorRecord>, DecodeError> {
    if frame.len() < RECORD_LEN {
        return Err(DecodeError::Truncated(frame.len()));
    }
    let count = 1 + (frame[0] >> 5) as usize;
    let mut records = Vec::with_capacity(count);
    for index in 0..count {
        let offset = index * RECORD_LEN;
        if offset + RECORD_LEN > frame.len() {
            break;
        }
        records.push(decode_record(&frame[offset..offset + RECORD_LEN]));
    }
    Ok(records)
}

fn decode_record(record: &[u8]) -> SensorRecord {
    // 设备标识反序存放：按 5..0 的字节序渲染十六进制
    let device_uid: String = record[1..7]
        .iter()
        .rev()
        .map(|byte| format!("{:02X}", byte))
        .collect();

    let timestamp = le_i64(record, 7);

    let temp_act = le_i16(record, 15) as f64 / 10.0;
    let temp_avg = le_i16(record, 17) as f64 / 10.0;
    let temp_max = le_i16(record, 19) as f64 / 10.0;
    let temp_min = le_i16(record, 21) as f64 / 10.0;
    let temp_max_offset = le_i16(record, 23) as i64;
    let temp_min_offset = le_i16(record, 25) as i64;

    let hum_act = record[27] as f64;
    let hum_avg = record[28] as f64;
    let hum_max = record[29] as f64;
    let hum_min = record[30] as f64;
    let hum_max_offset = le_i16(record, 31) as i64;
    let hum_min_offset = le_i16(record, 33) as i64;

    SensorRecord {
        device_uid,
        timestamp,
        temperature: ChannelStats {
            act: temp_act,
            avg: temp_avg,
            max: temp_max,
            max_ts: timestamp + temp_max_offset,
            min: temp_min,
            min_ts: timestamp + temp_min_offset,
        },
        humidity: ChannelStats {
            act: hum_act,
            avg: hum_avg,
            max: hum_max,
            max_ts: timestamp + hum_max_offset,
            min: hum_min,
            min_ts: timestamp + hum_min_offset,
        },
    }
}

/// 一条记录对应的六条归一化写入：温度与湿度各 min/max/avg。
///
/// 设备标识经旧版对照表解析出名称，组合成 `{NAME}_{uid}` 站点键，
/// 与查询侧的命名空间规则一致。
pub fn record_writes(
    prefix: &str,
    legacy_devices: &BTreeMap<String, String>,
    record: &SensorRecord,
) -> Vec<StatWrite> {
    let name = legacy_devices
        .get(&record.device_uid)
        .cloned()
        .unwrap_or_else(|| record.device_uid.clone());
    let base_path = format!("{}.{}_{}", prefix, name, record.device_uid);

    let mut writes = Vec::with_capacity(6);
    for (channel, stats) in [
        ("Temperature", &record.temperature),
        ("Humidity", &record.humidity),
    ] {
        writes.push(StatWrite {
            metric_path: format!("{}.{}.min", base_path, channel),
            value: stats.min,
            ts: stats.min_ts,
        });
        writes.push(StatWrite {
            metric_path: format!("{}.{}.max", base_path, channel),
            value: stats.max,
            ts: stats.max_ts,
        });
        writes.push(StatWrite {
            metric_path: format!("{}.{}.avg", base_path, channel),
            value: stats.avg,
            ts: record.timestamp,
        });
    }
    writes
}

fn le_i16(buf: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([buf[offset], buf[offset + 1]])
}

fn le_i64(buf: &[u8], offset: usize) -> i64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[offset..offset + 8]);
    i64::from_le_bytes(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_TS: i64 = 1_700_000_000;

    /// 构造一条已知字段值的记录。
    fn sample_record(header: u8) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[0] = header;
        // 设备标识 48E729C88B0C，反序存放
        record[1..7].copy_from_slice(&[0x0C, 0x8B, 0xC8, 0x29, 0xE7, 0x48]);
        record[7..15].copy_from_slice(&BASE_TS.to_le_bytes());
        record[15..17].copy_from_slice(&215i16.to_le_bytes()); // act 21.5
        record[17..19].copy_from_slice(&210i16.to_le_bytes()); // avg 21.0
        record[19..21].copy_from_slice(&243i16.to_le_bytes()); // max 24.3
        record[21..23].copy_from_slice(&185i16.to_le_bytes()); // min 18.5
        record[23..25].copy_from_slice(&(-3600i16).to_le_bytes()); // max 偏移
        record[25..27].copy_from_slice(&7200i16.to_le_bytes()); // min 偏移
        record[27] = 60; // hum act
        record[28] = 58; // hum avg
        record[29] = 75; // hum max
        record[30] = 45; // hum min
        record[31..33].copy_from_slice(&600i16.to_le_bytes());
        record[33..35].copy_from_slice(&(-600i16).to_le_bytes());
        record
    }

    #[test]
    fn decodes_known_record() {
        let records = decode_frame(&sample_record(0)).expect("decode");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.device_uid, "48E729C88B0C");
        assert_eq!(record.timestamp, BASE_TS);
        assert_eq!(record.temperature.act, 21.5);
        assert_eq!(record.temperature.avg, 21.0);
        assert_eq!(record.temperature.max, 24.3);
        assert_eq!(record.temperature.max_ts, BASE_TS - 3600);
        assert_eq!(record.temperature.min, 18.5);
        assert_eq!(record.temperature.min_ts, BASE_TS + 7200);
        assert_eq!(record.humidity.avg, 58.0);
        assert_eq!(record.humidity.max_ts, BASE_TS + 600);
        assert_eq!(record.humidity.min_ts, BASE_TS - 600);
    }

    #[test]
    fn record_yields_six_writes() {
        let mut legacy = BTreeMap::new();
        legacy.insert("48E729C88B0C".to_string(), "MAKRO".to_string());
        let records = decode_frame(&sample_record(0)).expect("decode");
        let writes = record_writes("monitoring_data", &legacy, &records[0]);
        assert_eq!(writes.len(), 6);

        let temp_min = writes
            .iter()
            .find(|write| write.metric_path == "monitoring_data.MAKRO_48E729C88B0C.Temperature.min")
            .expect("temperature min");
        assert_eq!(temp_min.value, 18.5);
        assert_eq!(temp_min.ts, BASE_TS + 7200);

        let hum_avg = writes
            .iter()
            .find(|write| write.metric_path == "monitoring_data.MAKRO_48E729C88B0C.Humidity.avg")
            .expect("humidity avg");
        assert_eq!(hum_avg.value, 58.0);
        assert_eq!(hum_avg.ts, BASE_TS);

        // 湿度不做缩放
        let hum_max = writes
            .iter()
            .find(|write| write.metric_path == "monitoring_data.MAKRO_48E729C88B0C.Humidity.max")
            .expect("humidity max");
        assert_eq!(hum_max.value, 75.0);
    }

    #[test]
    fn unknown_device_falls_back_to_uid() {
        let records = decode_frame(&sample_record(0)).expect("decode");
        let writes = record_writes("monitoring_data", &BTreeMap::new(), &records[0]);
        assert!(writes[0]
            .metric_path
            .starts_with("monitoring_data.48E729C88B0C_48E729C88B0C."));
    }

    #[test]
    fn multi_record_frame_decodes_each() {
        // 高 3 位 = 1 → 两条记录
        let mut frame = Vec::new();
        frame.extend_from_slice(&sample_record(0b0010_0000));
        frame.extend_from_slice(&sample_record(0));
        let records = decode_frame(&frame).expect("decode");
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn partial_trailing_record_is_discarded() {
        let mut frame = Vec::new();
        frame.extend_from_slice(&sample_record(0b0010_0000));
        frame.extend_from_slice(&sample_record(0)[..20]);
        let records = decode_frame(&frame).expect("decode");
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn short_frame_is_an_error() {
        assert!(matches!(decode_frame(&[0u8; 10]), Err(DecodeError::Truncated(10))));
        assert!(decode_frame(&[]).is_err());
    }
}
