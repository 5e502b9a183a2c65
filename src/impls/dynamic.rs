use crate::info::{Described, DynamicInfo, ListInfo, TypeInfo, TypeInfoCell};
use crate::value::Value;

impl Described for Value {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Dynamic(DynamicInfo::new::<Value>("Value")))
    }
}

impl Described for Vec<Value> {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| {
            TypeInfo::List(ListInfo::new::<Vec<Value>>("Vec<Value>", Value::type_info))
        })
    }
}
