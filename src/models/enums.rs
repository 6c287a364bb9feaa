//! Status and role enums shared across the schema.
//!
//! All of these are stored as TEXT columns constrained by database checks;
//! the macro below wires up string conversions plus sqlx TEXT codecs so the
//! enums can be used directly in `query_as` rows and bind parameters.

use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, Postgres};
use utoipa::ToSchema;

macro_rules! db_str_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $value:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
        pub enum $name {
            $(#[serde(rename = $value)] $variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self { $(Self::$variant => $value),+ }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($value => Ok(Self::$variant),)+
                    other => Err(format!("Invalid {}: {}", stringify!($name), other)),
                }
            }
        }

        impl sqlx::Type<Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<Postgres>>::type_info()
            }
        }

        impl<'r> Decode<'r, Postgres> for $name {
            fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
                let s: String = Decode::<Postgres>::decode(value)?;
                s.parse().map_err(|e: String| e.into())
            }
        }

        impl Encode<'_, Postgres> for $name {
            fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
                <String as Encode<Postgres>>::encode(self.as_str().to_string(), buf)
            }
        }
    };
}

db_str_enum! {
    /// User role; staff roles (admin, librarian) unlock circulation and CRUD.
    Role {
        Admin => "admin",
        Librarian => "librarian",
        Faculty => "faculty",
        Student => "student",
    }
}

impl Role {
    /// Admins and librarians act on other users' records
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Librarian)
    }
}

db_str_enum! {
    AccountStatus {
        Active => "active",
        Inactive => "inactive",
        Suspended => "suspended",
        Graduated => "graduated",
    }
}

db_str_enum! {
    /// Circulation status of one physical copy
    CopyStatus {
        Available => "available",
        Borrowed => "borrowed",
        Reserved => "reserved",
        Maintenance => "maintenance",
        Lost => "lost",
        Damaged => "damaged",
        Withdrawn => "withdrawn",
    }
}

db_str_enum! {
    CopyCondition {
        Excellent => "excellent",
        Good => "good",
        Fair => "fair",
        Poor => "poor",
        Damaged => "damaged",
    }
}

db_str_enum! {
    BorrowStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
        Returned => "returned",
        Overdue => "overdue",
        Lost => "lost",
    }
}

db_str_enum! {
    ReservationStatus {
        Active => "active",
        Fulfilled => "fulfilled",
        Expired => "expired",
        Cancelled => "cancelled",
    }
}

db_str_enum! {
    FineType {
        Overdue => "overdue",
        LostBook => "lost_book",
        DamagedBook => "damaged_book",
        ProcessingFee => "processing_fee",
        Other => "other",
    }
}

db_str_enum! {
    FineStatus {
        Unpaid => "unpaid",
        Paid => "paid",
        Waived => "waived",
        Disputed => "disputed",
    }
}

db_str_enum! {
    PaymentMethod {
        Cash => "cash",
        Card => "card",
        Online => "online",
        Waived => "waived",
    }
}

db_str_enum! {
    RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

db_str_enum! {
    NotificationType {
        DueReminder => "due_reminder",
        OverdueNotice => "overdue_notice",
        ReservationReady => "reservation_ready",
        FineNotice => "fine_notice",
        AccountStatus => "account_status",
        General => "general",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roles_round_trip() {
        for role in [Role::Admin, Role::Librarian, Role::Faculty, Role::Student] {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("superuser".parse::<Role>().is_err());
    }

    #[test]
    fn staff_roles() {
        assert!(Role::Admin.is_staff());
        assert!(Role::Librarian.is_staff());
        assert!(!Role::Faculty.is_staff());
        assert!(!Role::Student.is_staff());
    }

    #[test]
    fn snake_case_values_round_trip() {
        assert_eq!("lost_book".parse::<FineType>().unwrap(), FineType::LostBook);
        assert_eq!(FineType::LostBook.to_string(), "lost_book");
        assert_eq!(
            "reservation_ready".parse::<NotificationType>().unwrap(),
            NotificationType::ReservationReady
        );
    }
}
