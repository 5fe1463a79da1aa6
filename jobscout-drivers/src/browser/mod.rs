pub mod behavioral;
pub mod dom;
pub mod driver;
pub mod page;
pub mod session;
