pub mod submit_ticket;
