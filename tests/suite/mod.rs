mod app;
mod fetch;
