use crate::info::{Described, ScalarInfo, ScalarKind, TypeInfo, TypeInfoCell};

impl Described for bool {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<bool>("bool", ScalarKind::Bool)))
    }
}

impl Described for i64 {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<i64>("i64", ScalarKind::Int)))
    }
}

impl Described for f64 {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<f64>("f64", ScalarKind::Float)))
    }
}

impl Described for String {
    fn type_info() -> &'static TypeInfo {
        static CELL: TypeInfoCell = TypeInfoCell::new();
        CELL.get_or_init(|| TypeInfo::Scalar(ScalarInfo::new::<String>("String", ScalarKind::Text)))
    }
}
