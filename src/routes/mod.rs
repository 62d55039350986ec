pub mod invitaciones;
pub mod relaciones;
pub mod usuarios;
