mod supertypes;
