mod revolve;

pub use revolve::Revolve;
