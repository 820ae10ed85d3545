//! Values that can be bound to a SQLite query built at runtime.

use sqlx::encode::{Encode, IsNull};
use sqlx::error::BoxDynError;
use sqlx::sqlite::{Sqlite, SqliteTypeInfo};
use sqlx::Database;

#[derive(Clone, Debug, PartialEq)]
pub enum SqlValue {
    Null,
    Int(i64),
    Text(String),
}

impl From<i64> for SqlValue {
    fn from(n: i64) -> Self {
        SqlValue::Int(n)
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(SqlValue::Null)
    }
}

impl<'q> Encode<'q, Sqlite> for SqlValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Sqlite as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, BoxDynError> {
        match self {
            SqlValue::Null => <Option<i64> as Encode<Sqlite>>::encode_by_ref(&None, buf),
            SqlValue::Int(n) => <i64 as Encode<Sqlite>>::encode_by_ref(n, buf),
            SqlValue::Text(s) => <String as Encode<Sqlite>>::encode_by_ref(s, buf),
        }
    }
}

impl sqlx::Type<Sqlite> for SqlValue {
    fn type_info() -> SqliteTypeInfo {
        <String as sqlx::Type<Sqlite>>::type_info()
    }

    fn compatible(_ty: &SqliteTypeInfo) -> bool {
        true
    }
}
