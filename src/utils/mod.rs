pub mod interp;
pub mod vector3d;
