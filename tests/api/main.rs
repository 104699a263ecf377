mod checkout;
mod customer;
mod helpers;
mod operator;
mod postgres_store;
mod waitlist;
