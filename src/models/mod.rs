pub mod actor;
pub mod genre;
pub mod performance;
pub mod play;
pub mod reservation;
pub mod theatre_hall;
pub mod ticket;
pub mod user;

pub use actor::{Actor, ActorListItem, NewActor};
pub use genre::{Genre, NewGenre};
pub use performance::{
    NewPerformance, Performance, PerformanceDetail, PerformanceFilter, PerformanceListItem,
    TakenPlace,
};
pub use play::{NewPlay, Play, PlayDetail, PlayListItem};
pub use reservation::{NewReservation, Reservation, ReservationDetail, ReservationListItem};
pub use theatre_hall::{NewTheatreHall, TheatreHall, TheatreHallDetail};
pub use ticket::{NewTicket, Ticket, TicketDetail};
pub use user::{Credentials, User, UserView};
