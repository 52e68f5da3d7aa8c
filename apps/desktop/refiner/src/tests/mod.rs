mod navigation;
mod runtime;
mod startup;
