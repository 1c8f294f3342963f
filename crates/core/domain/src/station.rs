use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// 未知站点的缺省时区。
pub const DEFAULT_TIMEZONE: &str = "Europe/Warsaw";
/// 未知站点的缺省经度。
pub const DEFAULT_LONGITUDE: f64 = 50.0;
/// 未知站点的缺省纬度。
pub const DEFAULT_LATITUDE: f64 = 19.0;

/// 站点描述：从指标命名空间按请求重建，不做持久化。
#[derive(Debug, Clone, Serialize)]
pub struct Station {
    pub uid: String,
    pub name: String,
    /// 频道名 → 频道 ID。ID 是按本次频道集合重算出来的视图，
    /// 跨调用的持久键是频道名。
    pub serie: BTreeMap<String, u32>,
    pub description: String,
    pub timezone: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Station {
    /// 组合站点键 `{NAME}_{uid}`（指标路径第二段）。
    pub fn station_key(&self) -> String {
        format!("{}_{}", self.name, self.uid)
    }

    /// 按频道 ID（十进制字符串）反查频道名。
    pub fn channel_name_for(&self, serie_id: &str) -> Option<&str> {
        self.serie
            .iter()
            .find(|(_, id)| id.to_string() == serie_id)
            .map(|(name, _)| name.as_str())
    }
}

/// 给频道集合分配确定性整数 ID。
///
/// Temperature 固定为 1、Humidity 固定为 2（存在时）；其余频道名
/// 按字典序升序依次取 3、4、5…。相同的名称集合总是得到相同的分配。
pub fn assign_channel_ids(names: &BTreeSet<String>) -> BTreeMap<String, u32> {
    let mut serie = BTreeMap::new();
    if names.contains("Temperature") {
        serie.insert("Temperature".to_string(), 1);
    }
    if names.contains("Humidity") {
        serie.insert("Humidity".to_string(), 2);
    }
    let mut next_id = 3;
    for name in names {
        if !serie.contains_key(name) {
            serie.insert(name.clone(), next_id);
            next_id += 1;
        }
    }
    serie
}
