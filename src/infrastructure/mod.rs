pub mod checkout;
pub mod http;
pub mod in_memory;
