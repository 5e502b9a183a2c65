use dashmap::DashMap;

use crate::info::{Described, MapInfo, ObjectInfo, TypeInfo, TypeInfoCell};
use crate::value::{Object, OrderedMap, TextMap, Value};

impl Described for OrderedMap<Value, Value> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Map(MapInfo::new::<OrderedMap<Value, Value>>(
                "OrderedMap<Value, Value>",
                Value::type_info,
                Value::type_info,
            ))
        })
    }
}

impl Described for Object {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Object(ObjectInfo::new::<Object>("Object")))
    }
}

impl Described for TextMap {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Map(MapInfo::new::<TextMap>(
                "TextMap",
                String::type_info,
                String::type_info,
            ))
        })
    }
}

impl Described for DashMap<Value, Value> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::Map(MapInfo::new::<DashMap<Value, Value>>(
                "DashMap<Value, Value>",
                Value::type_info,
                Value::type_info,
            ))
        })
    }
}
