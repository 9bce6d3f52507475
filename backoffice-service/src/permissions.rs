//! Permission codes, one per gated operation.
//!
//! Codes are seeded as primary keys of the `permissions` table, so a role
//! grants an operation by holding a `role_permissions` row with its code.

pub mod permission {
    pub const GET_BY_ID: i32 = 1001;
    pub const LIST: i32 = 1002;
    pub const SEARCH_BY_ID: i32 = 1003;
    pub const SEARCH_BY_NAME: i32 = 1004;
}

pub mod role {
    pub const GET_BY_ID: i32 = 2001;
    pub const LIST: i32 = 2002;
    pub const LIST_PERMISSIONS: i32 = 2003;
    pub const EXISTS: i32 = 2004;
    pub const SEARCH_BY_NAME: i32 = 2005;
    pub const SEARCH_BY_ID: i32 = 2006;
}

pub mod user_type {
    pub const GET_BY_ID: i32 = 3001;
    pub const LIST: i32 = 3002;
    pub const EXISTS: i32 = 3003;
    pub const SEARCH_BY_ID: i32 = 3004;
    pub const SEARCH_BY_NAME: i32 = 3005;
}

pub mod user {
    pub const GET_BY_ID: i32 = 4001;
    pub const LIST: i32 = 4002;
    pub const SEARCH_BY_ID: i32 = 4003;
    pub const SEARCH_BY_EMAIL: i32 = 4004;
    pub const UPDATE_STATE: i32 = 4005;
    pub const UPDATE: i32 = 4006;
    pub const CREATE: i32 = 4007;
    pub const HAS_PERMISSION: i32 = 4008;
}

pub mod user_state_type {
    pub const GET_BY_ID: i32 = 5001;
    pub const LIST: i32 = 5002;
}

pub mod log {
    pub const LIST_BY_USER: i32 = 6001;
}

pub mod employee {
    pub const GET_BY_ID: i32 = 7001;
    pub const LIST: i32 = 7002;
    pub const SEARCH_BY_NAME: i32 = 7003;
    pub const CREATE: i32 = 7004;
    pub const UPDATE: i32 = 7005;
    pub const SEARCH_BY_ID: i32 = 7006;
    pub const DELETE: i32 = 7007;
}

pub mod item_type {
    pub const GET_BY_ID: i32 = 8001;
    pub const LIST: i32 = 8002;
}

pub mod item {
    pub const GET_BY_ID: i32 = 9001;
    pub const LIST: i32 = 9002;
    pub const SEARCH_BY_ID: i32 = 9003;
    pub const SEARCH_BY_NAME: i32 = 9004;
    pub const UPDATE_STATE: i32 = 9005;
    pub const UPDATE: i32 = 9006;
    pub const CREATE: i32 = 9007;
    pub const CHECK_STOCK: i32 = 9008;
}

pub mod additional_expense {
    pub const GET_BY_ID: i32 = 10001;
    pub const LIST: i32 = 10002;
    pub const CREATE: i32 = 10003;
    pub const DELETE: i32 = 10004;
    pub const UPDATE: i32 = 10005;
}

pub mod historical_item_price {
    pub const LIST_BY_ITEM: i32 = 11001;
}

pub mod comment {
    pub const GET_BY_ID: i32 = 12001;
    pub const LIST: i32 = 12002;
    pub const SEARCH_BY_EMAIL: i32 = 12003;
    pub const CREATE: i32 = 12004;
    pub const UPDATE: i32 = 12005;
    pub const SEARCH_BY_NAME: i32 = 12006;
    pub const SEARCH_BY_ID: i32 = 12007;
}

pub mod appointment {
    pub const GET_BY_ID: i32 = 13001;
    pub const LIST: i32 = 13002;
    pub const SEARCH_BY_STATE: i32 = 13003;
    pub const LIST_BY_CUSTOMER: i32 = 13004;
    pub const CREATE: i32 = 13005;
    pub const UPDATE: i32 = 13006;
    pub const SEARCH_BY_ID: i32 = 13007;
    pub const SEARCH_BY_CUSTOMER_ID: i32 = 13008;
    pub const GET_BY_CUSTOMER_AND_DATE: i32 = 13009;
    pub const DELETE: i32 = 13010;
    pub const COUNT_BY_HOUR: i32 = 13011;
}

pub mod customer {
    pub const LIST: i32 = 14001;
    pub const GET_BY_ID: i32 = 14002;
    pub const CREATE: i32 = 14003;
    pub const UPDATE: i32 = 14004;
    pub const GET_BY_EMAIL: i32 = 14005;
    pub const SEARCH_BY_ID: i32 = 14006;
    pub const SEARCH_BY_NAME: i32 = 14007;
    pub const SEARCH_BY_LAST_NAME: i32 = 14008;
    pub const GET_BY_PERSONAL_ID: i32 = 14009;
}

pub mod identifier_type {
    pub const LIST: i32 = 15001;
    pub const GET_BY_ID: i32 = 15002;
}

pub mod order_state_type {
    pub const GET_BY_ID: i32 = 16001;
    pub const LIST: i32 = 16002;
}

pub mod purchase_order {
    pub const GET_BY_ID: i32 = 17001;
    pub const LIST: i32 = 17002;
    pub const SEARCH_BY_ID: i32 = 17003;
    pub const LIST_BY_CUSTOMER: i32 = 17004;
    pub const LIST_BY_SELLER: i32 = 17005;
    pub const CHANGE_STATE: i32 = 17006;
    pub const UPDATE: i32 = 17007;
    pub const CREATE: i32 = 17008;
    pub const LIST_BY_STATE: i32 = 17009;
}

pub mod discount_type {
    pub const GET_BY_ID: i32 = 18001;
    pub const LIST: i32 = 18002;
    pub const CREATE: i32 = 18003;
}

pub mod invoice {
    pub const GET_BY_ID: i32 = 19001;
    pub const LIST: i32 = 19002;
    pub const SEARCH_BY_ID: i32 = 19003;
    pub const SEARCH_BY_CUSTOMER_PERSONAL_ID: i32 = 19004;
    pub const CREATE: i32 = 19005;
}

pub mod billing {
    pub const CALCULATE_SUBTOTAL: i32 = 20001;
    pub const CALCULATE_TOTAL: i32 = 20002;
}

pub mod tax_type {
    pub const GET_BY_ID: i32 = 21001;
    pub const LIST: i32 = 21002;
    pub const CREATE: i32 = 21003;
}

pub mod external_sale {
    pub const GET_BY_ID: i32 = 22001;
    pub const LIST: i32 = 22002;
    pub const CREATE: i32 = 22003;
}

pub mod sales_report {
    pub const VIEW: i32 = 23001;
}
