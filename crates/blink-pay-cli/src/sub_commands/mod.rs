pub mod balance;
pub mod contacts;
pub mod price;
pub mod proof;
pub mod receive;
pub mod send;
