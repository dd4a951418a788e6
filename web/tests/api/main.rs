mod backend_selection;
mod health_check;
mod helpers;
mod home;
mod images;
mod pipeline;
