mod mask;

pub(crate) use mask::mask;
